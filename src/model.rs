//! Response payloads returned by the `/YTdown` endpoint.
//!
//! Field names mirror the JSON the public API has always produced, which is
//! why a few of them are camelCase and others snake_case.

use serde::{Deserialize, Serialize};

use crate::identifier::VideoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// One candidate rendition of a video (e.g. 720p mp4).
///
/// `url` is never empty once a descriptor is part of a result. Descriptors
/// carrying a `note` are informational placeholders rather than direct
/// stream links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub quality: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything the caller receives for a resolved video.
///
/// A `success` status only means no hard failure happened: the static
/// fallback also reports success while carrying placeholder formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub status: ResponseStatus,
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_small: Option<String>,
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        rename = "viewCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub view_count: Option<u64>,
    pub formats: Vec<FormatDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_methods: Vec<String>,
}

impl VideoResult {
    /// Bare success result for `id`; adapters fill in whatever they learned.
    pub fn new(id: &VideoId, title: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            video_id: id.as_str().to_string(),
            title: title.into(),
            thumbnail: thumbnail.into(),
            thumbnail_small: None,
            duration: 0,
            author: None,
            view_count: None,
            formats: Vec::new(),
            note: None,
            alternative_methods: Vec::new(),
        }
    }

    pub fn has_formats(&self) -> bool {
        !self.formats.is_empty()
    }
}

/// JSON body for every non-success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub kind: String,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            kind: kind.into(),
        }
    }
}
