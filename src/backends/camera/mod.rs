// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    CaptureStage     │  ← Owns at most one stream
//! └──────────┬──────────┘
//!            │ open(StreamRequest)
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────────┐
//!       ▼              ▼
//!   ┌──────┐    ┌─────────────┐
//!   │ V4L2 │    │ Test pattern│
//!   └──────┘    └─────────────┘
//! ```

pub mod stream;
pub mod test_pattern;
pub mod types;
pub mod v4l2;

pub use stream::{CameraStream, LatestFrame, TrackRegistry, VideoTrack};
pub use test_pattern::TestPatternBackend;
pub use types::*;
pub use v4l2::V4l2Backend;

use futures::future::BoxFuture;
use std::sync::Arc;

/// Camera backend trait
///
/// Backends hand out [`CameraStream`]s and keep count of the tracks that are
/// still live, so callers can verify a teardown released the hardware.
pub trait CameraBackend: Send + Sync {
    // ===== Identity =====

    /// Which implementation this is
    fn backend_type(&self) -> CameraBackendType;

    // ===== Enumeration =====

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    // ===== Streaming =====

    /// Acquire a video stream
    ///
    /// Suspends until the device granted access and streaming started.
    /// The returned stream reports the native size the device delivers,
    /// which may differ from the requested preference.
    ///
    /// # Returns
    /// * `Ok(CameraStream)` - Stream is live
    /// * `Err(BackendError)` - Permission denied, device missing or unusable
    fn open(&self, request: &StreamRequest) -> BoxFuture<'static, BackendResult<CameraStream>>;

    /// Number of tracks opened by this backend that are still live
    fn open_tracks(&self) -> usize;
}

/// Create a backend instance of the given type
pub fn get_backend_for_type(backend_type: CameraBackendType) -> Arc<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Arc::new(V4l2Backend::new()),
        CameraBackendType::TestPattern => Arc::new(TestPatternBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_factory() {
        for backend_type in [CameraBackendType::V4l2, CameraBackendType::TestPattern] {
            let backend = get_backend_for_type(backend_type);
            assert_eq!(backend.backend_type(), backend_type);
            assert_eq!(backend.open_tracks(), 0);
        }
    }
}
