//! Index build and persistence errors.

use thiserror::Error;

use crate::index::entry::BackendId;

/// Errors that can occur while building, loading or persisting an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A registered backend has no usable URL definitions.
    #[error("backend `{backend}` is misconfigured: {reason}")]
    Configuration { backend: BackendId, reason: String },

    /// A raw URL base pattern failed to compile.
    #[error("backend `{backend}` declares invalid URL pattern `{pattern}`: {source}")]
    PatternCompile {
        backend: BackendId,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Reading or writing the generated artifact failed.
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The generated artifact is not valid JSON of the expected shape.
    #[error("artifact format error: {0}")]
    Artifact(#[from] serde_json::Error),

    /// The generated artifact was written by an incompatible format version.
    #[error("artifact format version {found} is not supported (expected {expected})")]
    ArtifactVersion { found: u32, expected: u32 },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_backend_and_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = IndexError::PatternCompile {
            backend: BackendId::new("sqs"),
            pattern: "(".to_string(),
            source,
        };
        let text = err.to_string();
        assert!(text.contains("`sqs`"));
        assert!(text.contains("`(`"));

        let err = IndexError::Configuration {
            backend: BackendId::new("batch"),
            reason: "no URL definitions registered".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "backend `batch` is misconfigured: no URL definitions registered"
        );
    }
}
