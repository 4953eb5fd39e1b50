// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP APIs)
// - `discord/` = Discord-specific adapters (commands, serenity-backed ports)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Shut down cleanly on Ctrl-C / SIGTERM

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::emoji_stats::{EmojiStatsConfig, EmojiStatsService};
use crate::core::stock::StockService;
use crate::core::timezones::TimezoneService;
use crate::discord::commands::{all_commands, presence, split_prefix};
use crate::discord::Data;
use crate::infra::stock::YahooFinanceClient;
use anyhow::{bail, Context as _};
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration as StdDuration;

const DEFAULT_PREFIX: &str = "$";
const TOKEN_FILE: &str = "bot-token";

struct BotConfig {
    token: String,
    prefix: String,
    emoji_stats: EmojiStatsConfig,
}

impl BotConfig {
    fn from_env() -> anyhow::Result<Self> {
        let token = match std::env::var("DISCORD_TOKEN") {
            Ok(token) => token,
            Err(_) => std::fs::read_to_string(TOKEN_FILE).with_context(|| {
                format!("Missing DISCORD_TOKEN and could not read the {TOKEN_FILE} file")
            })?,
        };
        let token = token.trim().to_string();
        if token.is_empty() {
            bail!("The Discord token is empty");
        }

        let prefix = std::env::var("BOT_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
        if prefix.trim().is_empty() {
            bail!("BOT_PREFIX must not be blank");
        }

        let emoji_stats = emoji_stats_config(
            std::env::var("EMOJI_SCAN_WEEKS").ok().as_deref(),
            std::env::var("EMOJI_SCAN_CHANNEL_TIMEOUT_SECS").ok().as_deref(),
        )?;

        Ok(Self {
            token,
            prefix,
            emoji_stats,
        })
    }
}

fn emoji_stats_config(weeks: Option<&str>, timeout_secs: Option<&str>) -> anyhow::Result<EmojiStatsConfig> {
    let mut config = EmojiStatsConfig::default();

    if let Some(weeks) = weeks {
        let weeks: i64 = weeks
            .trim()
            .parse()
            .with_context(|| format!("EMOJI_SCAN_WEEKS is not a number: {weeks}"))?;
        if weeks <= 0 {
            bail!("EMOJI_SCAN_WEEKS must be positive, got {weeks}");
        }
        config.lookback = chrono::Duration::weeks(weeks);
    }

    if let Some(secs) = timeout_secs {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("EMOJI_SCAN_CHANNEL_TIMEOUT_SECS is not a number: {secs}"))?;
        config.channel_timeout = (secs > 0).then(|| StdDuration::from_secs(secs));
    }

    Ok(config)
}

/// Only MESSAGE_CONTENT is privileged; the bot's own member is fetched over
/// HTTP when the cache lacks it.
fn gateway_intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILD_EMOJIS_AND_STICKERS
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = sigterm => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    tracing::info!(
        lookback_days = config.emoji_stats.lookback.num_days(),
        channel_timeout = ?config.emoji_stats.channel_timeout,
        "Emoji stats configured"
    );
    let emoji_stats = Arc::new(EmojiStatsService::new(config.emoji_stats));
    let timezones = Arc::new(TimezoneService::new());
    let stock_client = YahooFinanceClient::new().context("Failed to create the Yahoo Finance client")?;
    let stocks = Arc::new(StockService::new(stock_client));

    let data = Data {
        emoji_stats,
        timezones,
        stocks,
        active_scans: DashMap::new(),
        prefix: config.prefix,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = gateway_intents();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                // `$ emoji` and `$emoji` are the same command.
                stripped_dynamic_prefix: Some(|_ctx, msg, data| {
                    Box::pin(async move { Ok(split_prefix(&msg.content, &data.prefix)) })
                }),
                case_insensitive_commands: true,
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(
                        command = %ctx.command().qualified_name,
                        user = %ctx.author().name,
                        "Running command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!(
                    user = %ready.user.name,
                    id = %ready.user.id,
                    guilds = ready.guilds.len(),
                    "Bot is ready"
                );
                presence::on_ready(ctx, &data.prefix);
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, disconnecting");
        shard_manager.shutdown_all().await;
    });

    client.start().await.context("Error running bot")?;
    tracing::info!("Bot stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = emoji_stats_config(None, None).unwrap();
        assert_eq!(config.lookback, chrono::Duration::weeks(12));
        assert_eq!(config.channel_timeout, None);
    }

    #[test]
    fn reads_weeks_and_timeout() {
        let config = emoji_stats_config(Some("4"), Some(" 30 ")).unwrap();
        assert_eq!(config.lookback, chrono::Duration::weeks(4));
        assert_eq!(config.channel_timeout, Some(StdDuration::from_secs(30)));
    }

    #[test]
    fn zero_timeout_means_no_limit() {
        let config = emoji_stats_config(None, Some("0")).unwrap();
        assert_eq!(config.channel_timeout, None);
    }

    #[test]
    fn intents_avoid_the_member_list() {
        let intents = gateway_intents();
        assert!(!intents.contains(serenity::GatewayIntents::GUILD_MEMBERS));
        assert!(!intents.contains(serenity::GatewayIntents::GUILD_PRESENCES));
        assert!(intents.contains(serenity::GatewayIntents::MESSAGE_CONTENT));
    }

    #[test]
    fn rejects_bad_weeks() {
        assert!(emoji_stats_config(Some("soon"), None).is_err());
        assert!(emoji_stats_config(Some("0"), None).is_err());
    }
}
