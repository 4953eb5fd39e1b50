// Discord layer - commands and the serenity adapters for the core ports.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "emoji_stats/serenity_guild.rs"]
pub mod emoji_stats;

use crate::core::emoji_stats::EmojiStatsService;
use crate::core::stock::StockService;
use crate::core::timezones::TimezoneService;
use crate::infra::stock::YahooFinanceClient;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state every command can reach through `ctx.data()`.
pub struct Data {
    pub emoji_stats: Arc<EmojiStatsService>,
    pub timezones: Arc<TimezoneService>,
    pub stocks: Arc<StockService<YahooFinanceClient>>,
    /// Guilds with an emoji count in progress, and when it started.
    pub active_scans: DashMap<u64, DateTime<Utc>>,
    pub prefix: String,
}
