use super::VideoSource;
use crate::{
    error::ExtractError,
    identifier::VideoId,
    model::{FormatDescriptor, VideoResult},
};

/// Last-resort result built purely from the identifier.
///
/// The returned format links point at the public watch page and are not
/// direct downloads; they exist so the API always answers with something.
/// Callers can recognize this shape by `duration == 0`, the per-format
/// `note`, and the `alternative_methods` hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFallback;

impl StaticFallback {
    pub fn build(&self, id: &VideoId) -> VideoResult {
        let watch_url = format!("https://youtube.com/watch?v={id}");
        let mut result = VideoResult::new(id, "YouTube Video", id.thumbnail_url("maxresdefault"));
        result.thumbnail_small = Some(id.thumbnail_url("hqdefault"));
        result.formats.push(FormatDescriptor {
            quality: "360p".to_string(),
            url: watch_url.clone(),
            mime_type: "video/mp4".to_string(),
            size: None,
            note: Some("Use yt-dlp or similar tool to download".to_string()),
        });
        result.alternative_methods = vec![
            format!("yt-dlp {watch_url}"),
            "Use online YouTube downloader websites".to_string(),
        ];
        result
    }
}

impl VideoSource for StaticFallback {
    fn name(&self) -> &'static str {
        "static-fallback"
    }

    fn attempt(&self, id: &VideoId) -> Result<VideoResult, ExtractError> {
        Ok(self.build(id))
    }
}
