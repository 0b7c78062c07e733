use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{VideoSource, build_agent, non_empty, value_as_u64};
use crate::{
    config::SourceConfig,
    error::ExtractError,
    identifier::VideoId,
    model::{FormatDescriptor, VideoResult},
};

const NAME: &str = "mirror-api";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Queries Invidious-compatible mirrors (`/api/v1/videos/{id}`) in order and
/// returns the first one that answers.
pub struct MirrorApiSource {
    agent: ureq::Agent,
    instances: Vec<String>,
    max_formats: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorVideo {
    title: Option<String>,
    thumbnails: Option<Vec<MirrorThumbnail>>,
    length_seconds: Option<Value>,
    author: Option<String>,
    view_count: Option<Value>,
    // Some instances send `null` instead of an empty list.
    format_streams: Option<Vec<MirrorStream>>,
    adaptive_formats: Option<Vec<MirrorStream>>,
}

#[derive(Debug, Deserialize)]
struct MirrorThumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorStream {
    url: Option<String>,
    quality_label: Option<String>,
    resolution: Option<String>,
    height: Option<Value>,
    #[serde(rename = "type")]
    mime_type: Option<String>,
    content_length: Option<Value>,
    bitrate: Option<Value>,
}

impl MirrorApiSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            agent: build_agent(config),
            instances: config.mirror_instances.clone(),
            max_formats: config.max_formats,
        }
    }

    fn fetch(&self, instance: &str, id: &VideoId) -> Result<MirrorVideo, ExtractError> {
        let api_url = format!("{instance}/api/v1/videos/{id}");
        debug!(%api_url, "querying mirror");
        let response = self.agent.get(&api_url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => {
                ExtractError::upstream(NAME, format!("{instance} answered HTTP {code}"))
            }
            ureq::Error::Transport(transport) => {
                ExtractError::upstream(NAME, format!("{instance}: {transport}"))
            }
        })?;
        response
            .into_json::<MirrorVideo>()
            .map_err(|err| ExtractError::parse(NAME, format!("{instance}: {err}")))
    }
}

impl VideoSource for MirrorApiSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn attempt(&self, id: &VideoId) -> Result<VideoResult, ExtractError> {
        for instance in &self.instances {
            match self.fetch(instance, id) {
                Ok(video) => return Ok(into_result(id, video, self.max_formats)),
                Err(err) => {
                    warn!(video_id = %id, error = %err, "mirror instance failed");
                }
            }
        }
        Err(ExtractError::upstream(
            NAME,
            format!("all {} mirror instances failed", self.instances.len()),
        ))
    }
}

fn into_result(id: &VideoId, video: MirrorVideo, max_formats: usize) -> VideoResult {
    let mut formats: Vec<FormatDescriptor> = video
        .format_streams
        .unwrap_or_default()
        .iter()
        .filter_map(direct_format)
        .collect();
    formats.extend(
        video
            .adaptive_formats
            .unwrap_or_default()
            .iter()
            .filter_map(adaptive_format),
    );

    let note = if formats.is_empty() {
        "No direct URLs found"
    } else {
        "Direct download available"
    };
    formats.truncate(max_formats);

    let thumbnail = video
        .thumbnails
        .as_deref()
        .and_then(|thumbs| thumbs.get(3))
        .and_then(|thumb| non_empty(thumb.url.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| id.thumbnail_url("maxresdefault"));
    let title = non_empty(video.title.as_deref()).unwrap_or("YouTube Video");

    let mut result = VideoResult::new(id, title, thumbnail);
    result.duration = video.length_seconds.as_ref().and_then(value_as_u64).unwrap_or(0);
    result.author = Some(
        non_empty(video.author.as_deref())
            .unwrap_or("Unknown")
            .to_string(),
    );
    result.view_count = Some(video.view_count.as_ref().and_then(value_as_u64).unwrap_or(0));
    result.formats = formats;
    result.note = Some(note.to_string());
    result
}

/// Muxed audio+video stream.
fn direct_format(stream: &MirrorStream) -> Option<FormatDescriptor> {
    let url = non_empty(stream.url.as_deref())?;
    let quality = non_empty(stream.quality_label.as_deref())
        .map(str::to_string)
        .or_else(|| {
            stream
                .height
                .as_ref()
                .and_then(value_as_u64)
                .map(|height| format!("{height}p"))
        })
        .or_else(|| non_empty(stream.resolution.as_deref()).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    Some(FormatDescriptor {
        quality,
        url: url.to_string(),
        mime_type: non_empty(stream.mime_type.as_deref())
            .unwrap_or("video/mp4")
            .to_string(),
        size: Some(size_label(stream.content_length.as_ref())),
        note: None,
    })
}

/// Video-only or audio-only stream; entries without a media type are skipped.
fn adaptive_format(stream: &MirrorStream) -> Option<FormatDescriptor> {
    let url = non_empty(stream.url.as_deref())?;
    let mime_type = non_empty(stream.mime_type.as_deref())?;
    if !(mime_type.contains("video") || mime_type.contains("audio")) {
        return None;
    }
    let quality = non_empty(stream.quality_label.as_deref())
        .map(str::to_string)
        .or_else(|| {
            stream
                .bitrate
                .as_ref()
                .and_then(value_as_u64)
                .filter(|bitrate| *bitrate > 0)
                .map(|bitrate| format!("{}kbps", (bitrate as f64 / 1000.0).round() as u64))
        })
        .unwrap_or_else(|| "audio".to_string());
    Some(FormatDescriptor {
        quality,
        url: url.to_string(),
        mime_type: mime_type.to_string(),
        size: Some(size_label(stream.content_length.as_ref())),
        note: None,
    })
}

fn size_label(content_length: Option<&Value>) -> String {
    match content_length.and_then(value_as_u64) {
        Some(bytes) => format!("{} MB", (bytes as f64 / BYTES_PER_MB).round() as u64),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identifier::extract_video_id, test_support::spawn_upstream};
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode,
        routing::get,
    };
    use serde_json::json;
    use std::time::Duration;

    fn video_id() -> VideoId {
        extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap()
    }

    fn config_for(instances: Vec<String>) -> SourceConfig {
        SourceConfig {
            mirror_instances: instances,
            request_timeout: Duration::from_secs(5),
            ..SourceConfig::default()
        }
    }

    fn sample_payload() -> Value {
        json!({
            "title": "Never Gonna Give You Up",
            "author": "Rick Astley",
            "viewCount": 1500000000u64,
            "lengthSeconds": 212,
            "thumbnails": [
                {"url": "https://t/0.jpg"},
                {"url": "https://t/1.jpg"},
                {"url": "https://t/2.jpg"},
                {"url": "https://t/3.jpg"}
            ],
            "formatStreams": [
                {"url": "https://cdn/720.mp4", "qualityLabel": "720p", "type": "video/mp4; codecs=\"avc1\"", "contentLength": "15728640"},
                {"qualityLabel": "360p", "type": "video/mp4"}
            ],
            "adaptiveFormats": [
                {"url": "https://cdn/audio.m4a", "type": "audio/mp4", "bitrate": "129481"},
                {"url": "https://cdn/subs", "type": "text/vtt"}
            ]
        })
    }

    #[test]
    fn maps_streams_into_formats() {
        let video: MirrorVideo = serde_json::from_value(sample_payload()).unwrap();
        let result = into_result(&video_id(), video, 10);

        assert_eq!(result.title, "Never Gonna Give You Up");
        assert_eq!(result.thumbnail, "https://t/3.jpg");
        assert_eq!(result.duration, 212);
        assert_eq!(result.author.as_deref(), Some("Rick Astley"));
        assert_eq!(result.view_count, Some(1_500_000_000));
        assert_eq!(result.note.as_deref(), Some("Direct download available"));

        assert_eq!(result.formats.len(), 2);
        assert_eq!(result.formats[0].quality, "720p");
        assert_eq!(result.formats[0].size.as_deref(), Some("15 MB"));
        assert_eq!(result.formats[1].quality, "129kbps");
        assert_eq!(result.formats[1].mime_type, "audio/mp4");
        assert_eq!(result.formats[1].size.as_deref(), Some("Unknown"));
    }

    #[test]
    fn fills_defaults_for_sparse_payload() {
        let video: MirrorVideo = serde_json::from_value(json!({
            "title": "",
            "formatStreams": [{"url": "https://cdn/a", "height": 480}]
        }))
        .unwrap();
        let result = into_result(&video_id(), video, 10);

        assert_eq!(result.title, "YouTube Video");
        assert_eq!(
            result.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(result.duration, 0);
        assert_eq!(result.author.as_deref(), Some("Unknown"));
        assert_eq!(result.view_count, Some(0));
        assert_eq!(result.formats[0].quality, "480p");
        assert_eq!(result.formats[0].mime_type, "video/mp4");
    }

    #[test]
    fn null_lists_keep_remaining_streams() {
        let video: MirrorVideo = serde_json::from_value(json!({
            "title": "Audio only",
            "formatStreams": null,
            "thumbnails": null,
            "adaptiveFormats": [{"url": "https://cdn/audio.m4a", "type": "audio/mp4"}]
        }))
        .unwrap();
        let result = into_result(&video_id(), video, 10);

        assert_eq!(result.formats.len(), 1);
        assert_eq!(result.formats[0].url, "https://cdn/audio.m4a");
        assert_eq!(
            result.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(result.note.as_deref(), Some("Direct download available"));
    }

    #[test]
    fn caps_format_count() {
        let streams: Vec<Value> = (0..14)
            .map(|i| json!({"url": format!("https://cdn/{i}"), "qualityLabel": format!("{i}p")}))
            .collect();
        let video: MirrorVideo =
            serde_json::from_value(json!({ "formatStreams": streams })).unwrap();
        let result = into_result(&video_id(), video, 10);
        assert_eq!(result.formats.len(), 10);
        assert_eq!(result.formats[0].url, "https://cdn/0");
        assert_eq!(result.formats[9].url, "https://cdn/9");
    }

    #[test]
    fn empty_stream_lists_are_reported() {
        let video: MirrorVideo = serde_json::from_value(json!({"title": "x"})).unwrap();
        let result = into_result(&video_id(), video, 10);
        assert!(!result.has_formats());
        assert_eq!(result.note.as_deref(), Some("No direct URLs found"));
    }

    #[test]
    fn adaptive_quality_falls_back_to_audio_label() {
        let stream: MirrorStream =
            serde_json::from_value(json!({"url": "https://cdn/a", "type": "audio/webm"})).unwrap();
        assert_eq!(adaptive_format(&stream).unwrap().quality, "audio");
        let untyped: MirrorStream = serde_json::from_value(json!({"url": "https://cdn/a"})).unwrap();
        assert!(adaptive_format(&untyped).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn skips_failing_instances_in_order() {
        let broken = spawn_upstream(Router::new().route(
            "/api/v1/videos/{id}",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;
        let garbage = spawn_upstream(Router::new().route(
            "/api/v1/videos/{id}",
            get(|| async { "<html>not json</html>" }),
        ))
        .await;
        let healthy = spawn_upstream(Router::new().route(
            "/api/v1/videos/{id}",
            get(|Path(id): Path<String>| async move {
                let mut payload = sample_payload();
                payload["title"] = json!(format!("served {id}"));
                Json(payload)
            }),
        ))
        .await;

        let source = MirrorApiSource::new(&config_for(vec![
            "http://127.0.0.1:1".to_string(),
            broken,
            garbage,
            healthy,
        ]));
        let result = tokio::task::spawn_blocking(move || source.attempt(&video_id()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.title, "served dQw4w9WgXcQ");
        assert_eq!(result.formats.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fails_when_every_instance_fails() {
        let broken = spawn_upstream(Router::new().route(
            "/api/v1/videos/{id}",
            get(|| async { StatusCode::NOT_FOUND }),
        ))
        .await;
        let source = MirrorApiSource::new(&config_for(vec![broken]));
        let err = tokio::task::spawn_blocking(move || source.attempt(&video_id()))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_failure");
    }

    #[test]
    fn empty_instance_list_fails() {
        let source = MirrorApiSource::new(&config_for(Vec::new()));
        assert!(source.attempt(&video_id()).is_err());
    }
}
