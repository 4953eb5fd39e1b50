// In-memory guild and sink used by the emoji stats tests.

use super::emoji_stats_models::{ChannelInfo, EmojiCatalog, HistoryMessage, ScanWindow};
use super::emoji_stats_ports::{ChannelHistorySource, EmojiStatsError, GuildDirectory, MessageSink};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const BOT_ID: u64 = 999;

pub fn fixed_window() -> ScanWindow {
    let end = Utc.with_ymd_and_hms(2024, 3, 25, 12, 0, 0).unwrap();
    ScanWindow::ending_at(end, Duration::weeks(12))
}

pub fn channel(id: u64, name: &str) -> ChannelInfo {
    ChannelInfo {
        id,
        name: name.to_string(),
        can_read_history: true,
    }
}

pub fn message(author_id: u64, content: &str, reactions: &[&str]) -> HistoryMessage {
    HistoryMessage {
        author_id,
        content: content.to_string(),
        reactions: reactions.iter().map(|r| r.to_string()).collect(),
    }
}

pub struct FakeGuild {
    catalog: Option<EmojiCatalog>,
    channels: Vec<ChannelInfo>,
    histories: HashMap<u64, Vec<HistoryMessage>>,
    failing: HashSet<u64>,
    requests: DashMap<u64, DateTime<Utc>>,
}

impl FakeGuild {
    pub fn new(catalog: EmojiCatalog) -> Self {
        Self {
            catalog: Some(catalog),
            channels: Vec::new(),
            histories: HashMap::new(),
            failing: HashSet::new(),
            requests: DashMap::new(),
        }
    }

    pub fn without_catalog() -> Self {
        Self {
            catalog: None,
            ..Self::new(EmojiCatalog::default())
        }
    }

    pub fn with_channel(mut self, info: ChannelInfo, messages: Vec<HistoryMessage>) -> Self {
        self.histories.insert(info.id, messages);
        self.channels.push(info);
        self
    }

    /// The channel yields its messages, then a fetch error.
    pub fn with_failing_channel(mut self, info: ChannelInfo, messages: Vec<HistoryMessage>) -> Self {
        self.failing.insert(info.id);
        self.with_channel(info, messages)
    }

    pub fn with_unreadable_channel(self, id: u64, name: &str, messages: Vec<HistoryMessage>) -> Self {
        let info = ChannelInfo {
            can_read_history: false,
            ..channel(id, name)
        };
        self.with_channel(info, messages)
    }

    pub fn requested_after(&self, channel_id: u64) -> Option<DateTime<Utc>> {
        self.requests.get(&channel_id).map(|entry| *entry)
    }

    pub fn was_requested(&self, channel_id: u64) -> bool {
        self.requests.contains_key(&channel_id)
    }
}

impl ChannelHistorySource for FakeGuild {
    fn history(
        &self,
        channel_id: u64,
        after: DateTime<Utc>,
    ) -> BoxStream<'_, Result<HistoryMessage, EmojiStatsError>> {
        self.requests.insert(channel_id, after);

        let messages = self.histories.get(&channel_id).cloned().unwrap_or_default();
        let tail = self.failing.contains(&channel_id).then(|| {
            Err(EmojiStatsError::History {
                channel_id,
                reason: "connection reset".to_string(),
            })
        });

        stream::iter(messages.into_iter().map(Ok).chain(tail)).boxed()
    }
}

#[async_trait]
impl GuildDirectory for FakeGuild {
    fn guild_name(&self) -> &str {
        "Test Guild"
    }

    fn self_id(&self) -> u64 {
        BOT_ID
    }

    async fn emoji_catalog(&self) -> Result<EmojiCatalog, EmojiStatsError> {
        self.catalog
            .clone()
            .ok_or_else(|| EmojiStatsError::CatalogUnavailable("guild not cached".to_string()))
    }

    async fn channels(&self) -> Result<Vec<ChannelInfo>, EmojiStatsError> {
        Ok(self.channels.clone())
    }
}

/// Records every line; optionally rejects the line at one index.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, text: String) -> Result<(), EmojiStatsError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts - 1
        };

        if self.fail_at == Some(attempt) {
            return Err(EmojiStatsError::Send("missing permissions".to_string()));
        }

        self.lines.lock().unwrap().push(text);
        Ok(())
    }
}
