//! Upstream adapters. Each one tries a single kind of source and reports
//! either a result or an [`ExtractError`]; a failing adapter never affects
//! the others.

mod embed;
mod fallback;
mod mirror;

pub use embed::EmbedPageSource;
pub use fallback::StaticFallback;
pub use mirror::MirrorApiSource;

use serde_json::Value;

use crate::{config::SourceConfig, error::ExtractError, identifier::VideoId, model::VideoResult};

/// A strategy that attempts to resolve a video from one upstream.
///
/// Implementations perform blocking network I/O; callers on an async runtime
/// should run them on the blocking pool.
pub trait VideoSource: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    fn attempt(&self, id: &VideoId) -> Result<VideoResult, ExtractError>;
}

/// HTTP agent shared by the network adapters: bounded timeout and a
/// browser-like user agent.
fn build_agent(config: &SourceConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
}

/// Reads a non-negative integer that upstreams encode either as a JSON number
/// or as a numeric string.
fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
