// Domain models for the emoji statistics pipeline.
//
// Nothing in here knows about Discord. Tokens are plain strings and channels are
// plain ids so the whole pipeline can be driven by fakes in tests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Canonical textual form of one guild emoji, e.g. `<:pog:1234>` or `🎉`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmojiToken(String);

impl EmojiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmojiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The emojis registered in a guild when a scan starts.
///
/// Captured once and shared read-only between every channel task. Order matters:
/// it breaks ties when the report is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiCatalog {
    tokens: Vec<EmojiToken>,
}

impl EmojiCatalog {
    pub fn new(tokens: Vec<EmojiToken>) -> Self {
        Self { tokens }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmojiToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for EmojiCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(EmojiToken::new).collect())
    }
}

/// Number of times each emoji was seen.
///
/// **Baseline invariant:** a table produced by [`FrequencyTable::seeded`] holds
/// exactly one entry per catalog token, starting at [`FrequencyTable::BASELINE`].
/// That makes "seen zero times" (count 1) distinguishable from "not tracked"
/// (no entry). Readers must subtract the baseline before showing a count, see
/// [`FrequencyTable::displayed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<EmojiToken, u64>,
}

impl FrequencyTable {
    pub const BASELINE: u64 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// A table with every catalog token set to the baseline.
    pub fn seeded(catalog: &EmojiCatalog) -> Self {
        let counts = catalog
            .iter()
            .map(|token| (token.clone(), Self::BASELINE))
            .collect();
        Self { counts }
    }

    pub fn increment(&mut self, token: &EmojiToken) {
        *self.counts.entry(token.clone()).or_insert(0) += 1;
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (token, count) in &other.counts {
            *self.counts.entry(token.clone()).or_insert(0) += count;
        }
    }

    /// Raw count, baseline included when the table is seeded.
    pub fn get(&self, token: &EmojiToken) -> Option<u64> {
        self.counts.get(token).copied()
    }

    /// Count with the baseline removed, never below zero.
    pub fn displayed(&self, token: &EmojiToken) -> u64 {
        self.get(token)
            .unwrap_or(0)
            .saturating_sub(Self::BASELINE)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Lookback interval ending at the moment the command was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScanWindow {
    pub fn ending_at(end: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: end - lookback,
            end,
        }
    }
}

/// A message as the scanner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub author_id: u64,
    pub content: String,
    /// Canonical tokens of the reactions on the message.
    pub reactions: Vec<String>,
}

/// A guild channel together with the bot's permission to read its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    pub can_read_history: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScanResult {
    pub channel_id: u64,
    pub channel_name: String,
    pub message_count: u64,
    /// Counts for this channel alone, without baseline.
    pub frequencies: FrequencyTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildScanResult {
    pub window: ScanWindow,
    pub catalog: Arc<EmojiCatalog>,
    /// Sum of all channel tables plus the baseline.
    pub frequencies: FrequencyTable,
    pub total_messages: u64,
    /// Successful channel scans, in the order they were started.
    pub channels: Vec<ChannelScanResult>,
    pub failed_channels: usize,
}

impl GuildScanResult {
    /// True when channels were scanned but not one of them produced data.
    pub fn all_channels_failed(&self) -> bool {
        self.failed_channels > 0 && self.channels.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EmojiStatsConfig {
    pub lookback: Duration,
    /// `None` lets a channel scan run as long as it needs.
    pub channel_timeout: Option<StdDuration>,
}

impl EmojiStatsConfig {
    pub const DEFAULT_LOOKBACK_WEEKS: i64 = 12;
}

impl Default for EmojiStatsConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::weeks(Self::DEFAULT_LOOKBACK_WEEKS),
            channel_timeout: None,
        }
    }
}
