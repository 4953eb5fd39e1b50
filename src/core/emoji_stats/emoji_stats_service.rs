// Emoji statistics service - the single entry point the Discord layer calls.
//
// Flow: capture the catalog, resolve channels, fan out one scan per channel,
// merge, format, send. Everything that reaches the user goes through the sink.

use super::emoji_stats_models::{EmojiStatsConfig, GuildScanResult, ScanWindow};
use super::emoji_stats_ports::{ChannelHistorySource, EmojiStatsError, GuildDirectory, MessageSink};
use super::guild_aggregator::{scan_guild, GuildScan};
use super::report_formatter::format_report;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const GENERIC_ERROR_LINE: &str = "```Failed to count the emojis. Please try again later.```";
pub const NO_DATA_LINE: &str = "```No data```";

pub struct EmojiStatsService {
    config: EmojiStatsConfig,
}

impl EmojiStatsService {
    pub fn new(config: EmojiStatsConfig) -> Self {
        Self { config }
    }

    /// Scans the guild and sends the report to `sink`.
    ///
    /// Nothing is returned: problems with individual channels or lines are
    /// logged, and a missing catalog turns into one generic error line.
    pub async fn run_report<G, K>(&self, guild: Arc<G>, sink: &K)
    where
        G: GuildDirectory + ChannelHistorySource + 'static,
        K: MessageSink + ?Sized,
    {
        self.run_report_at(guild, sink, Utc::now()).await
    }

    /// Same as [`run_report`](Self::run_report) with the window ending at `now`.
    pub async fn run_report_at<G, K>(&self, guild: Arc<G>, sink: &K, now: DateTime<Utc>)
    where
        G: GuildDirectory + ChannelHistorySource + 'static,
        K: MessageSink + ?Sized,
    {
        let result = match self.scan(Arc::clone(&guild), now).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(guild = %guild.guild_name(), "Emoji count aborted: {}", e);
                deliver(sink, GENERIC_ERROR_LINE.to_string()).await;
                return;
            }
        };

        tracing::info!(
            guild = %guild.guild_name(),
            channels = result.channels.len(),
            failed_channels = result.failed_channels,
            total_messages = result.total_messages,
            "Emoji count finished"
        );

        if result.all_channels_failed() {
            deliver(sink, NO_DATA_LINE.to_string()).await;
            return;
        }

        for block in format_report(&result) {
            deliver(sink, block).await;
        }
    }

    /// The scan without any output. Fails only when the guild itself cannot be
    /// described (no catalog, no channel list).
    pub async fn scan<G>(&self, guild: Arc<G>, now: DateTime<Utc>) -> Result<GuildScanResult, EmojiStatsError>
    where
        G: GuildDirectory + ChannelHistorySource + 'static,
    {
        let catalog = Arc::new(guild.emoji_catalog().await?);
        let channels = guild.channels().await?;
        let window = ScanWindow::ending_at(now, self.config.lookback);

        tracing::info!(
            guild = %guild.guild_name(),
            emojis = catalog.len(),
            channels = channels.len(),
            "Start counting emojis in {}",
            guild.guild_name()
        );

        let scan = GuildScan {
            channels,
            catalog,
            window,
            self_id: guild.self_id(),
            channel_timeout: self.config.channel_timeout,
        };

        Ok(scan_guild(guild, scan).await)
    }
}

/// One attempt per line; a failure is logged and the caller moves on.
async fn deliver<K: MessageSink + ?Sized>(sink: &K, text: String) {
    if let Err(e) = sink.send(text).await {
        tracing::warn!("Failed to send emoji report line: {}", e);
    }
}
