// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose-heatmaps library.

use std::fmt;

/// Result type alias for pose-heatmap operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose-heatmaps library.
#[derive(Debug)]
pub enum PoseError {
    /// Input array shape does not match the contract (wrong dimensionality,
    /// keypoint count mismatch, instance count mismatch).
    ShapeMismatch(String),
    /// Invalid configuration or schema provided.
    ConfigError(String),
    /// Error during heatmap spatial resizing.
    ResizeError(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch(msg) => write!(f, "Shape mismatch: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::ResizeError(msg) => write!(f, "Resize error: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {}

impl From<fast_image_resize::ResizeError> for PoseError {
    fn from(err: fast_image_resize::ResizeError) -> Self {
        Self::ResizeError(err.to_string())
    }
}

impl From<fast_image_resize::ImageBufferError> for PoseError {
    fn from(err: fast_image_resize::ImageBufferError) -> Self {
        Self::ResizeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::ShapeMismatch("expected [N, 4, 17]".to_string());
        assert_eq!(err.to_string(), "Shape mismatch: expected [N, 4, 17]");

        let err = PoseError::ConfigError("test".to_string());
        assert_eq!(err.to_string(), "Config error: test");

        let err = PoseError::ResizeError("test".to_string());
        assert_eq!(err.to_string(), "Resize error: test");
    }
}
