//! Video identifier extraction from free-form URLs.

use std::{fmt, sync::LazyLock};

use regex::Regex;

/// Recognizers tried in order; the first capture wins. The overlap between
/// them is harmless because the order makes the result deterministic.
static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})",
        r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid video id pattern"))
    .collect()
});

/// The 11-character token naming a single video.
///
/// Only the shape is checked; nothing confirms the video exists upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    pub fn thumbnail_url(&self, variant: &str) -> String {
        format!("https://img.youtube.com/vi/{}/{variant}.jpg", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the identifier captured by the first matching pattern, or `None`
/// when the input holds no recognizable YouTube URL.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|id| VideoId(id.as_str().to_string()))
    })
}
