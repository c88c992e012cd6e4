// SPDX-License-Identifier: MPL-2.0

//! Error types shared across the session pipeline
//!
//! Only [`CaptureError::AcquisitionDenied`] is meant to cross from the capture
//! stage into the session controller. Feedback and export failures are
//! absorbed where they happen.

use crate::backends::camera::types::BackendError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`CaptureStage::activate`](crate::pipelines::photo::CaptureStage::activate)
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera permission or hardware unavailable
    #[error("camera acquisition denied: {0}")]
    AcquisitionDenied(#[source] BackendError),

    /// The stage was deactivated while acquisition was in flight
    #[error("acquisition superseded by a teardown")]
    Superseded,

    /// `activate` was called while a stream is already held or being acquired
    #[error("camera stage is already active")]
    AlreadyActive,
}

impl CaptureError {
    /// Whether the failure should be reported to the customer
    pub fn is_denied(&self) -> bool {
        matches!(self, CaptureError::AcquisitionDenied(_))
    }
}

/// Audio/visual cue could not be played
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback output unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("feedback disabled")]
    Disabled,
}

/// Errors while encoding or saving a captured frame
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode photo: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no captured photo to export")]
    NothingCaptured,

    #[error("export task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_denial_is_reported() {
        let denied = CaptureError::AcquisitionDenied(BackendError::PermissionDenied(
            "/dev/video0".into(),
        ));
        assert!(denied.is_denied());
        assert!(!CaptureError::Superseded.is_denied());
        assert!(!CaptureError::AlreadyActive.is_denied());
    }

    #[test]
    fn test_write_error_names_path() {
        let err = ExportError::Write {
            path: PathBuf::from("/tmp/photo.png"),
            source: std::io::Error::other("disk full"),
        };
        let text = err.to_string();
        assert!(text.contains("/tmp/photo.png"));
        assert!(text.contains("disk full"));
    }
}
