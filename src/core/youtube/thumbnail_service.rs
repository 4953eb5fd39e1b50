// YouTube thumbnail lookup for the `thumbnail` command.
//
// The max-res thumbnail URL is deterministic, so no API call is needed. Discord
// caches embeds per URL; the `v=` suffix changes every second so a re-uploaded
// thumbnail shows up.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^.*(?:(?:youtu\.be/|v/|vi/|u/\w/|embed/)|(?:(?:watch)?\?v(?:i)?=|&v(?:i)?=))([^#&?]+).*$",
    )
    .expect("video id pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThumbnailError {
    #[error("Not a YouTube video URL: {0}")]
    NotAVideoUrl(String),
}

pub fn video_id(url: &str) -> Result<&str, ThumbnailError> {
    VIDEO_ID
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
        .ok_or_else(|| ThumbnailError::NotAVideoUrl(url.to_string()))
}

pub fn thumbnail_url(url: &str, now: DateTime<Utc>) -> Result<String, ThumbnailError> {
    let id = video_id(url)?;
    Ok(format!(
        "https://i.ytimg.com/vi/{}/maxresdefault.jpg?v={}",
        id,
        cache_buster(now)
    ))
}

/// URL-safe base64 of the big-endian 32-bit Unix timestamp.
fn cache_buster(now: DateTime<Utc>) -> String {
    let bytes = (now.timestamp() as u32).to_be_bytes();
    URL_SAFE_NO_PAD.encode(bytes.trim_ascii_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn extracts_ids_from_common_url_shapes() {
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtu.be/dQw4w9WgXcQ?t=42", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/embed/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ#t=1", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/v/dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        ];

        for (url, expected) in cases {
            assert_eq!(video_id(url), Ok(expected), "{url}");
        }
    }

    #[test]
    fn rejects_non_video_urls() {
        assert!(video_id("https://example.com/").is_err());
        assert!(video_id("not a url").is_err());
    }

    #[test]
    fn builds_maxres_url_with_timestamp_suffix() {
        // 0x65920080 -> [0x65, 0x92, 0x00, 0x80]
        let now = Utc.timestamp_opt(0x6592_0080, 0).unwrap();

        assert_eq!(
            thumbnail_url("https://youtu.be/dQw4w9WgXcQ", now).unwrap(),
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg?v=ZZIAgA"
        );
    }
}
