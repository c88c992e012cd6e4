// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::camera::{PREFERRED_HEIGHT, PREFERRED_WIDTH};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Camera backend type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackendType {
    /// Video4Linux2 capture device
    #[default]
    V4l2,
    /// Synthetic color bars, no hardware needed
    TestPattern,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::TestPattern => write!(f, "test pattern"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
    pub driver: Option<String>,
}

/// Parameters of a stream acquisition
///
/// Width and height are a preference; the backend reports the size it
/// actually delivers on the returned stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub width: u32,
    pub height: u32,
    /// Device path, or `None` for the first capture device found
    pub device: Option<String>,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            width: PREFERRED_WIDTH,
            height: PREFERRED_HEIGHT,
            device: None,
        }
    }
}

/// A single RGBA video frame
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub data: Arc<[u8]>,
    /// When the frame arrived from the device
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw()),
            captured_at: Instant::now(),
        }
    }

    /// Copy the pixels into an owned image buffer
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Backend is not available on this system
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// The device exists but may not be opened
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Format not supported
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// Failed to start streaming
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl BackendError {
    /// Classify an I/O error raised while opening `path`
    pub fn from_io(path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(path.to_string()),
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(path.to_string()),
            _ => BackendError::IoError(format!("{}: {}", path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_io_error_classification() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from_io("/dev/video0", &denied),
            BackendError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            BackendError::from_io("/dev/video9", &missing),
            BackendError::DeviceNotFound(_)
        ));

        let busy = std::io::Error::other("busy");
        assert!(matches!(
            BackendError::from_io("/dev/video0", &busy),
            BackendError::IoError(_)
        ));
    }

    #[test]
    fn test_frame_image_conversion() {
        let image = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let frame = CameraFrame::from_image(image.clone());
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.to_image(), Some(image));
    }

    #[test]
    fn test_frame_with_short_buffer() {
        let frame = CameraFrame {
            width: 4,
            height: 4,
            data: Arc::from(vec![0u8; 8]),
            captured_at: Instant::now(),
        };
        assert!(frame.to_image().is_none());
    }

    #[test]
    fn test_default_request_is_preferred_size() {
        let request = StreamRequest::default();
        assert_eq!((request.width, request.height), (1280, 720));
        assert!(request.device.is_none());
    }

    #[test]
    fn test_backend_type_serde() {
        let json = serde_json::to_string(&CameraBackendType::TestPattern).unwrap();
        assert_eq!(json, "\"test-pattern\"");
    }
}
