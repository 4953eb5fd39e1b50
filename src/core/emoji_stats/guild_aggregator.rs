use super::channel_aggregator::scan_channel;
use super::emoji_stats_models::{
    ChannelInfo, ChannelScanResult, EmojiCatalog, FrequencyTable, GuildScanResult, ScanWindow,
};
use super::emoji_stats_ports::{ChannelHistorySource, EmojiStatsError};
use std::sync::Arc;
use std::time::Duration;

/// Everything a guild-wide scan needs, captured up front.
pub struct GuildScan {
    pub channels: Vec<ChannelInfo>,
    pub catalog: Arc<EmojiCatalog>,
    pub window: ScanWindow,
    pub self_id: u64,
    pub channel_timeout: Option<Duration>,
}

/// Scans every readable channel concurrently and merges the results.
///
/// One task per eligible channel; the tasks share nothing but the read-only
/// catalog. Handles are joined in spawn order so the merge never depends on
/// which channel finished first. A channel that fails, panics or times out is
/// logged and left out; its siblings are unaffected.
pub async fn scan_guild<H>(history: Arc<H>, scan: GuildScan) -> GuildScanResult
where
    H: ChannelHistorySource + 'static,
{
    let GuildScan {
        channels,
        catalog,
        window,
        self_id,
        channel_timeout,
    } = scan;

    let eligible: Vec<ChannelInfo> = channels
        .into_iter()
        .filter(|channel| channel.can_read_history)
        .collect();

    let handles: Vec<_> = eligible
        .iter()
        .map(|channel| {
            let history = Arc::clone(&history);
            let catalog = Arc::clone(&catalog);
            let channel = channel.clone();

            tokio::spawn(async move {
                let scan = scan_channel(history.as_ref(), &channel, &catalog, window, self_id);
                match channel_timeout {
                    Some(limit) => match tokio::time::timeout(limit, scan).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(EmojiStatsError::Timeout {
                            channel_id: channel.id,
                            after: limit,
                        }),
                    },
                    None => scan.await,
                }
            })
        })
        .collect();

    let outcomes = futures::future::join_all(handles).await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failed_channels = 0;
    for (channel, outcome) in eligible.iter().zip(outcomes) {
        let outcome = outcome.unwrap_or_else(|join_err| {
            Err(EmojiStatsError::Task {
                channel_id: channel.id,
                reason: join_err.to_string(),
            })
        });

        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                failed_channels += 1;
                tracing::warn!(
                    channel_id = channel.id,
                    channel = %channel.name,
                    "Skipping channel in emoji count: {}",
                    e
                );
            }
        }
    }

    merge(catalog, window, results, failed_channels)
}

/// Sums the channel tables, then adds the baseline for every catalog entry.
pub fn merge(
    catalog: Arc<EmojiCatalog>,
    window: ScanWindow,
    channels: Vec<ChannelScanResult>,
    failed_channels: usize,
) -> GuildScanResult {
    let mut frequencies = FrequencyTable::seeded(&catalog);
    let mut total_messages = 0;

    for channel in &channels {
        frequencies.merge(&channel.frequencies);
        total_messages += channel.message_count;
    }

    GuildScanResult {
        window,
        catalog,
        frequencies,
        total_messages,
        channels,
        failed_channels,
    }
}
