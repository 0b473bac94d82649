// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the point cloud viewer

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Calibration lookup or construction errors
    Calibration(CalibrationError),
    /// GPU upload, draw, or readback errors
    Render(RenderError),
    /// Video stream acquisition errors
    Source(SourceError),
    /// Configuration errors
    Config(String),
    /// File system errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Calibration-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// The camera identity matches no known profile
    UnsupportedCamera(String),
    /// A distortion table pairs a model with coefficients it cannot carry
    DistortionModelMismatch(String),
}

/// Rendering errors
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A single frame failed to upload; the next iteration retries
    FrameUpload(String),
    /// Device or pipeline setup failed
    Gpu(String),
    /// Reading the rendered image back failed
    Readback(String),
}

/// Video source errors
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// A frame file could not be opened or decoded
    Load(String),
    /// Color and depth streams disagree or are unusable
    InvalidStream(String),
    /// The acquisition task ended before delivering streams
    Cancelled,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Calibration(e) => write!(f, "Calibration error: {}", e),
            AppError::Render(e) => write!(f, "Render error: {}", e),
            AppError::Source(e) => write!(f, "Source error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::UnsupportedCamera(identity) => {
                write!(f, "Unsupported camera: {}", identity)
            }
            CalibrationError::DistortionModelMismatch(msg) => {
                write!(f, "Distortion model mismatch: {}", msg)
            }
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::FrameUpload(msg) => write!(f, "Frame upload failed: {}", msg),
            RenderError::Gpu(msg) => write!(f, "GPU error: {}", msg),
            RenderError::Readback(msg) => write!(f, "Readback failed: {}", msg),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Load(msg) => write!(f, "Failed to load frame: {}", msg),
            SourceError::InvalidStream(msg) => write!(f, "Invalid stream: {}", msg),
            SourceError::Cancelled => write!(f, "Stream acquisition cancelled"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CalibrationError {}
impl std::error::Error for RenderError {}
impl std::error::Error for SourceError {}

impl From<CalibrationError> for AppError {
    fn from(err: CalibrationError) -> Self {
        AppError::Calibration(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<image::ImageError> for SourceError {
    fn from(err: image::ImageError) -> Self {
        SourceError::Load(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_camera_message_names_identity() {
        let err = CalibrationError::UnsupportedCamera("XYZ999".to_string());
        assert_eq!(err.to_string(), "Unsupported camera: XYZ999");
    }

    #[test]
    fn test_sub_errors_wrap_into_app_error() {
        let err: AppError = RenderError::FrameUpload("size".into()).into();
        assert!(matches!(err, AppError::Render(RenderError::FrameUpload(_))));
        assert_eq!(err.to_string(), "Render error: Frame upload failed: size");
    }
}
