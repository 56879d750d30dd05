//! Error types for the mealscan inference engine.

use thiserror::Error;

/// Result type used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the classification engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The model artifact is missing, corrupt, or the runtime rejected it.
    /// Fatal to the engine instance being constructed.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The uploaded bytes are not a decodable raster image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The decoded image could not be shaped into the model's input tensor.
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    /// The forward pass or output extraction failed inside the runtime.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl Error {
    /// The pipeline stage this error belongs to, for structured failure
    /// reporting. Load errors surface before any request runs and have no
    /// stage.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Decode(_) => Some(Stage::Decode),
            Error::Preprocess(_) => Some(Stage::Preprocess),
            Error::Inference(_) => Some(Stage::Inference),
            Error::ModelLoad(_) => None,
        }
    }
}

/// Request-time pipeline stage, attached to structured failures so logs can
/// tell which step rejected an image without changing the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Preprocess,
    Inference,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Decode => write!(f, "decode"),
            Stage::Preprocess => write!(f, "preprocess"),
            Stage::Inference => write!(f, "inference"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_classification() {
        assert_eq!(Error::Decode("bad".into()).stage(), Some(Stage::Decode));
        assert_eq!(
            Error::Preprocess("shape".into()).stage(),
            Some(Stage::Preprocess)
        );
        assert_eq!(
            Error::Inference("oom".into()).stage(),
            Some(Stage::Inference)
        );
        assert_eq!(Error::ModelLoad("gone".into()).stage(), None);
    }

    #[test]
    fn test_error_messages_are_nonempty() {
        let err = Error::Decode("not an image".to_string());
        assert!(!err.to_string().is_empty());
        assert!(err.to_string().contains("not an image"));
    }
}
