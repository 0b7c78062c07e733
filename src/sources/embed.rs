use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{VideoSource, build_agent, non_empty, value_as_u64};
use crate::{
    config::SourceConfig,
    error::ExtractError,
    identifier::VideoId,
    model::{FormatDescriptor, VideoResult},
};

const NAME: &str = "embed-page";

static PLAYER_CONFIG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ytplayer\.config\s*=\s*(\{.*?\});").expect("valid player config pattern")
});

/// Scrapes the embeddable player page for the inline player configuration.
///
/// The page never exposes stream URLs, so the single format returned is a
/// back-link to the watch page.
pub struct EmbedPageSource {
    agent: ureq::Agent,
    embed_base: String,
}

impl EmbedPageSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            agent: build_agent(config),
            embed_base: config.embed_base.clone(),
        }
    }
}

impl VideoSource for EmbedPageSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn attempt(&self, id: &VideoId) -> Result<VideoResult, ExtractError> {
        let embed_url = format!("{}/embed/{id}", self.embed_base);
        debug!(%embed_url, "fetching embed page");
        let body = self
            .agent
            .get(&embed_url)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => {
                    ExtractError::upstream(NAME, format!("embed fetch failed: HTTP {code}"))
                }
                ureq::Error::Transport(transport) => {
                    ExtractError::upstream(NAME, transport.to_string())
                }
            })?
            .into_string()
            .map_err(|err| ExtractError::upstream(NAME, format!("reading embed page: {err}")))?;
        parse_embed_page(id, &body)
    }
}

fn parse_embed_page(id: &VideoId, html: &str) -> Result<VideoResult, ExtractError> {
    let raw = PLAYER_CONFIG
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ExtractError::parse(NAME, "no player config block in embed page"))?;
    let config: Value = serde_json::from_str(raw.as_str())
        .map_err(|err| ExtractError::parse(NAME, format!("player config: {err}")))?;
    let args = config.get("args").cloned().unwrap_or(Value::Null);

    let title = non_empty(args.get("title").and_then(Value::as_str)).unwrap_or("YouTube Video");
    let thumbnail = non_empty(args.get("thumbnail_url").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| id.thumbnail_url("maxresdefault"));

    let mut result = VideoResult::new(id, title, thumbnail);
    result.duration = args.get("length_seconds").and_then(value_as_u64).unwrap_or(0);
    result.formats.push(FormatDescriptor {
        quality: "Various".to_string(),
        url: id.watch_url(),
        mime_type: "video/mp4".to_string(),
        size: None,
        note: Some("Use third-party tools for direct download".to_string()),
    });
    Ok(result)
}
