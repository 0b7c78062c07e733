//! Ordered fallback chain over the source adapters.

use tracing::{info, warn};

use crate::{
    config::SourceConfig,
    error::ExtractError,
    identifier::extract_video_id,
    model::VideoResult,
    sources::{EmbedPageSource, MirrorApiSource, StaticFallback, VideoSource},
};

/// Tries each source in priority order and accepts the first result that
/// carries at least one format. When none does, the static fallback answers.
pub struct Extractor {
    sources: Vec<Box<dyn VideoSource>>,
    fallback: StaticFallback,
}

impl Extractor {
    pub fn new(sources: Vec<Box<dyn VideoSource>>) -> Self {
        Self {
            sources,
            fallback: StaticFallback,
        }
    }

    /// Production chain: mirror API first, then the embed page.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(vec![
            Box::new(MirrorApiSource::new(config)),
            Box::new(EmbedPageSource::new(config)),
        ])
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Resolves `raw_url`. The only error is [`ExtractError::InvalidInput`];
    /// adapter failures are logged and skipped.
    ///
    /// Blocking: adapters perform synchronous HTTP calls.
    pub fn extract(&self, raw_url: &str) -> Result<VideoResult, ExtractError> {
        let id = extract_video_id(raw_url).ok_or(ExtractError::InvalidInput)?;
        info!(video_id = %id, "processing video");

        for source in &self.sources {
            match source.attempt(&id) {
                Ok(result) if result.has_formats() => {
                    info!(video_id = %id, source = source.name(), "resolved");
                    return Ok(result);
                }
                Ok(_) => {
                    warn!(video_id = %id, source = source.name(), "no usable formats");
                }
                Err(err) => {
                    warn!(video_id = %id, source = source.name(), error = %err, "source failed");
                }
            }
        }

        info!(video_id = %id, "falling back to static templates");
        Ok(self.fallback.build(&id))
    }
}
