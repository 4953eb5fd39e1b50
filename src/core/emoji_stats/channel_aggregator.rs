use super::emoji_scanner::scan_message;
use super::emoji_stats_models::{ChannelInfo, ChannelScanResult, EmojiCatalog, FrequencyTable, ScanWindow};
use super::emoji_stats_ports::{ChannelHistorySource, EmojiStatsError};
use futures::TryStreamExt;

/// Walks one channel's history inside the window and tallies its emojis.
///
/// Messages written by `self_id` are skipped entirely. The stream is consumed
/// one message at a time, so long histories never sit in memory. A history
/// error aborts this channel only; nothing is retried.
pub async fn scan_channel<H>(
    history: &H,
    channel: &ChannelInfo,
    catalog: &EmojiCatalog,
    window: ScanWindow,
    self_id: u64,
) -> Result<ChannelScanResult, EmojiStatsError>
where
    H: ChannelHistorySource + ?Sized,
{
    tracing::debug!(channel = %channel.name, "Start counting in #{}", channel.name);

    let mut frequencies = FrequencyTable::new();
    let mut message_count = 0u64;

    let mut messages = history.history(channel.id, window.start);
    while let Some(message) = messages.try_next().await? {
        if message.author_id == self_id {
            continue;
        }

        message_count += 1;
        frequencies.merge(&scan_message(catalog, &message));
    }

    tracing::debug!(
        channel = %channel.name,
        message_count,
        "Finish counting {} message(s) in #{}",
        message_count,
        channel.name
    );

    Ok(ChannelScanResult {
        channel_id: channel.id,
        channel_name: channel.name.clone(),
        message_count,
        frequencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::emoji_stats::test_support::{channel, fixed_window, message, FakeGuild, BOT_ID};
    use crate::core::emoji_stats::{EmojiToken, HistoryMessage};
    use chrono::{DateTime, Utc};
    use futures::stream::{self, BoxStream, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Produces messages on demand and counts how many were pulled.
    /// `len: None` never ends.
    struct GeneratedHistory {
        len: Option<usize>,
        fail_at: Option<usize>,
        pulled: Arc<AtomicUsize>,
    }

    impl GeneratedHistory {
        fn new(len: Option<usize>, fail_at: Option<usize>) -> Self {
            Self {
                len,
                fail_at,
                pulled: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn pulled(&self) -> usize {
            self.pulled.load(Ordering::SeqCst)
        }
    }

    impl ChannelHistorySource for GeneratedHistory {
        fn history(
            &self,
            channel_id: u64,
            _after: DateTime<Utc>,
        ) -> BoxStream<'_, Result<HistoryMessage, EmojiStatsError>> {
            let (len, fail_at) = (self.len, self.fail_at);
            let pulled = Arc::clone(&self.pulled);

            stream::unfold(0usize, move |index| {
                let pulled = Arc::clone(&pulled);
                async move {
                    if len.is_some_and(|len| index >= len) {
                        return None;
                    }
                    pulled.fetch_add(1, Ordering::SeqCst);

                    let item = if fail_at == Some(index) {
                        Err(EmojiStatsError::History {
                            channel_id,
                            reason: "page request failed".to_string(),
                        })
                    } else {
                        Ok(message(7, "A", &[]))
                    };
                    Some((item, index + 1))
                }
            })
            .boxed()
        }
    }

    #[tokio::test]
    async fn counts_messages_and_emojis() {
        let catalog: EmojiCatalog = ["A", "B"].into_iter().collect();
        let guild = FakeGuild::new(catalog.clone())
            .with_channel(channel(1, "general"), vec![message(7, "hi A", &[]), message(8, "", &["B"])]);

        let result = scan_channel(&guild, &channel(1, "general"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap();

        assert_eq!(result.message_count, 2);
        assert_eq!(result.frequencies.get(&EmojiToken::new("A")), Some(1));
        assert_eq!(result.frequencies.get(&EmojiToken::new("B")), Some(1));
    }

    #[tokio::test]
    async fn own_messages_never_count() {
        let catalog: EmojiCatalog = ["A"].into_iter().collect();
        let guild = FakeGuild::new(catalog.clone()).with_channel(
            channel(1, "general"),
            vec![message(BOT_ID, "A A A", &["A"]), message(BOT_ID, "A", &[])],
        );

        let result = scan_channel(&guild, &channel(1, "general"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap();

        assert_eq!(result.message_count, 0);
        assert!(result.frequencies.is_empty());
    }

    #[tokio::test]
    async fn history_failure_fails_the_channel() {
        let catalog: EmojiCatalog = ["A"].into_iter().collect();
        let guild = FakeGuild::new(catalog.clone())
            .with_failing_channel(channel(3, "broken"), vec![message(7, "A", &[])]);

        let err = scan_channel(&guild, &channel(3, "broken"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap_err();

        assert!(matches!(err, EmojiStatsError::History { channel_id: 3, .. }));
    }

    #[tokio::test]
    async fn history_is_requested_from_window_start() {
        let catalog: EmojiCatalog = ["A"].into_iter().collect();
        let guild = FakeGuild::new(catalog.clone()).with_channel(channel(1, "general"), vec![]);

        scan_channel(&guild, &channel(1, "general"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap();

        assert_eq!(guild.requested_after(1), Some(fixed_window().start));
    }

    #[tokio::test]
    async fn long_history_is_consumed_as_it_is_produced() {
        let catalog: EmojiCatalog = ["A"].into_iter().collect();
        let history = GeneratedHistory::new(Some(50_000), None);

        let result = scan_channel(&history, &channel(1, "general"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap();

        assert_eq!(result.message_count, 50_000);
        assert_eq!(result.frequencies.get(&EmojiToken::new("A")), Some(50_000));
        assert_eq!(history.pulled(), 50_000);
    }

    #[tokio::test]
    async fn endless_history_stops_being_pulled_at_the_first_error() {
        let catalog: EmojiCatalog = ["A"].into_iter().collect();
        let history = GeneratedHistory::new(None, Some(3));

        let err = scan_channel(&history, &channel(1, "general"), &catalog, fixed_window(), BOT_ID)
            .await
            .unwrap_err();

        assert!(matches!(err, EmojiStatsError::History { channel_id: 1, .. }));
        // Three messages and the failing page, nothing read ahead.
        assert_eq!(history.pulled(), 4);
    }
}
