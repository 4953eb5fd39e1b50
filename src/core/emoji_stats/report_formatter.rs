// Turns a guild scan into chat-sized text blocks.
//
// Rows are tab separated with `{:>3}` counts so they paste into a spreadsheet.

use super::emoji_stats_models::{ChannelScanResult, GuildScanResult};
use chrono::{DateTime, FixedOffset, Utc};
use unicode_width::UnicodeWidthStr;

/// Discord rejects messages longer than this.
pub const MAX_MESSAGE_LEN: usize = 2000;
pub const EMOJIS_PER_ROW: usize = 10;
pub const CHANNEL_NAME_WIDTH: usize = 50;
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;
const CODE_FENCE: &str = "```";

/// Summary block(s) first, then one block per emoji row.
pub fn format_report(result: &GuildScanResult) -> Vec<String> {
    let mut blocks = format_summary(result);

    let entries = emoji_entries(result);
    if tracing::enabled!(tracing::Level::DEBUG) {
        for entry in &entries {
            tracing::debug!("{}", entry);
        }
    }
    blocks.extend(group_rows(entries, EMOJIS_PER_ROW));

    blocks
}

/// Header line plus one aligned line per channel, busiest first, fenced so the
/// columns line up. Split into several messages when needed.
pub fn format_summary(result: &GuildScanResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Counted from {} (UTC+8), {} message(s)",
        format_display_time(result.window.start),
        result.total_messages
    )];

    let mut channels: Vec<&ChannelScanResult> = result.channels.iter().collect();
    // sort_by is stable: equal counts keep enumeration order.
    channels.sort_by(|a, b| b.message_count.cmp(&a.message_count));
    lines.extend(channels.into_iter().map(|channel| {
        format!(
            "{}{}",
            pad_to_width(&channel.channel_name, CHANNEL_NAME_WIDTH),
            channel.message_count
        )
    }));

    chunk_fenced(lines, MAX_MESSAGE_LEN)
}

/// `"<emoji>: <count>"` for every tracked emoji, baseline removed, most used
/// first. Ties keep catalog order.
pub fn emoji_entries(result: &GuildScanResult) -> Vec<String> {
    let mut counts: Vec<(&str, u64)> = result
        .catalog
        .iter()
        .map(|token| (token.as_str(), result.frequencies.displayed(token)))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .map(|(token, count)| format!("{}: {:>3}", token, count))
        .collect()
}

/// Fixed-size rows joined by tabs; the last row is padded with empty cells.
pub fn group_rows(entries: Vec<String>, per_row: usize) -> Vec<String> {
    entries
        .chunks(per_row)
        .map(|chunk| {
            let mut row: Vec<&str> = chunk.iter().map(String::as_str).collect();
            row.resize(per_row, "");
            row.join("\t")
        })
        .collect()
}

/// Left-aligns `text` in a field `width` columns wide. Wide characters
/// (CJK, most emoji) take two columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

pub fn format_display_time(time: DateTime<Utc>) -> String {
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET_SECS) else {
        return time.format("%Y-%m-%d %H:%M:%S").to_string();
    };
    time.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Packs lines into fenced blocks no longer than `limit` characters each.
fn chunk_fenced(lines: Vec<String>, limit: usize) -> Vec<String> {
    // Opening fence + newline, closing newline + fence.
    let overhead = CODE_FENCE.len() * 2 + 2;
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for line in lines {
        let line_len = line.chars().count() + 1;
        if !current.is_empty() && overhead + current_len + line_len > limit {
            blocks.push(fence(&current));
            current.clear();
            current_len = 0;
        }
        current_len += line_len;
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(fence(&current));
    }

    blocks
}

fn fence(lines: &[String]) -> String {
    format!("{CODE_FENCE}\n{}\n{CODE_FENCE}", lines.join("\n"))
}
