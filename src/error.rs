//! Error kinds produced while resolving a video.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input string did not contain a recognizable video identifier.
    #[error("Invalid YouTube URL. Provide a valid YouTube video URL.")]
    InvalidInput,

    /// An upstream could not be reached or answered with a non-success status.
    #[error("{adapter}: upstream unavailable: {message}")]
    Upstream {
        adapter: &'static str,
        message: String,
    },

    /// An upstream answered but the body could not be interpreted.
    #[error("{adapter}: unparseable response: {message}")]
    Parse {
        adapter: &'static str,
        message: String,
    },
}

impl ExtractError {
    pub fn upstream(adapter: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            adapter,
            message: message.into(),
        }
    }

    pub fn parse(adapter: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            adapter,
            message: message.into(),
        }
    }

    /// Stable machine-readable tag exposed in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Upstream { .. } => "upstream_failure",
            Self::Parse { .. } => "parse_failure",
        }
    }
}
