//! Error type shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, assembling, mixing or exporting stems.
#[derive(Error, Debug)]
pub enum StemError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(
        "the following stems appear silent (RMS<{threshold:e}): {}",
        stems.join(", ")
    )]
    SilentStem { stems: Vec<String>, threshold: f64 },

    #[error("format mismatch: {0}")]
    FormatMismatch(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("invalid gain {gain} for stem {stem}: gains must be finite and non-negative")]
    InvalidGain { stem: String, gain: f32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("encode error: {0}")]
    Encode(#[from] hound::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StemError {
    pub(crate) fn decode(path: impl Into<PathBuf>, source: symphonia::core::errors::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_stem_message_names_every_stem() {
        let err = StemError::SilentStem {
            stems: vec!["drums".to_string(), "piano".to_string()],
            threshold: 1e-6,
        };
        let message = err.to_string();
        assert!(message.contains("drums, piano"));
        assert!(message.contains("1e-6"));
    }

    #[test]
    fn external_tool_message_is_verbatim() {
        let err = StemError::tool("ffmpeg", "Invalid data found when processing input");
        assert_eq!(
            err.to_string(),
            "ffmpeg failed: Invalid data found when processing input"
        );
    }
}
