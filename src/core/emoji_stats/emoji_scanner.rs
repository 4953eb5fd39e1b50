use super::emoji_stats_models::{EmojiCatalog, FrequencyTable, HistoryMessage};

/// Counts catalog emojis in a single message.
///
/// Each token gains at most 1 from the text (containment, not occurrences) and
/// at most 1 from the reactions, so a message contributes 0, 1 or 2 per token.
/// The returned delta is not seeded with the baseline.
pub fn scan_message(catalog: &EmojiCatalog, message: &HistoryMessage) -> FrequencyTable {
    let mut delta = FrequencyTable::new();

    for token in catalog.iter() {
        if message.content.contains(token.as_str()) {
            delta.increment(token);
        }
        if message
            .reactions
            .iter()
            .any(|reaction| reaction == token.as_str())
        {
            delta.increment(token);
        }
    }

    delta
}
