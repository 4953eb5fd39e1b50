// Ports for the emoji statistics pipeline.
//
// The core says WHAT it needs from the chat platform; the Discord layer
// provides the HOW (serenity HTTP calls, the cache, channel messages).

use super::emoji_stats_models::{ChannelInfo, EmojiCatalog, HistoryMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmojiStatsError {
    #[error("Failed to read history of channel {channel_id}: {reason}")]
    History { channel_id: u64, reason: String },

    #[error("Scan of channel {channel_id} timed out after {after:?}")]
    Timeout { channel_id: u64, after: Duration },

    #[error("Scan task for channel {channel_id} failed: {reason}")]
    Task { channel_id: u64, reason: String },

    #[error("Emoji catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Channel list unavailable: {0}")]
    ChannelsUnavailable(String),

    #[error("Failed to deliver message: {0}")]
    Send(String),
}

/// Lazily yields the messages of one channel.
pub trait ChannelHistorySource: Send + Sync {
    /// Messages posted strictly after `after`, oldest first.
    ///
    /// Implementations must fetch page by page; a channel may hold far more
    /// history than fits in memory.
    fn history(
        &self,
        channel_id: u64,
        after: DateTime<Utc>,
    ) -> BoxStream<'_, Result<HistoryMessage, EmojiStatsError>>;
}

/// What the pipeline needs to know about the guild being scanned.
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    fn guild_name(&self) -> &str;

    /// User id of the bot itself. Its messages are never counted.
    fn self_id(&self) -> u64;

    async fn emoji_catalog(&self) -> Result<EmojiCatalog, EmojiStatsError>;

    /// Every text channel with the bot's read-history permission resolved.
    async fn channels(&self) -> Result<Vec<ChannelInfo>, EmojiStatsError>;
}

/// Where report lines go. One call per line or block.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: String) -> Result<(), EmojiStatsError>;
}
