pub mod channel_aggregator;
pub mod emoji_scanner;
pub mod emoji_stats_models;
pub mod emoji_stats_ports;
pub mod emoji_stats_service;
pub mod guild_aggregator;
pub mod report_formatter;

#[cfg(test)]
mod test_support;

pub use emoji_stats_models::{
    ChannelInfo, ChannelScanResult, EmojiCatalog, EmojiStatsConfig, EmojiToken, FrequencyTable,
    GuildScanResult, HistoryMessage, ScanWindow,
};
pub use emoji_stats_ports::{ChannelHistorySource, EmojiStatsError, GuildDirectory, MessageSink};
pub use emoji_stats_service::EmojiStatsService;
