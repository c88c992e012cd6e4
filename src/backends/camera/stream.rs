// SPDX-License-Identifier: GPL-3.0-only

//! Acquired camera streams and their tracks
//!
//! A [`CameraStream`] holds one or more [`VideoTrack`]s. Each track is
//! registered with its backend's [`TrackRegistry`] while it is live, so the
//! number of open tracks can be checked after a teardown. Stopping is
//! idempotent and also happens on drop.

use super::types::CameraFrame;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::AbortHandle;
use tracing::debug;

/// Slot holding the most recent frame delivered by a track
pub type LatestFrame = Arc<Mutex<Option<Arc<CameraFrame>>>>;

/// Counter of live tracks, shared by a backend and every track it opened
#[derive(Debug, Clone, Default)]
pub struct TrackRegistry(Arc<AtomicUsize>);

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracks that have not been stopped yet
    pub fn open_count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn register(&self) -> Registration {
        self.0.fetch_add(1, Ordering::SeqCst);
        Registration(self.0.clone())
    }
}

/// Decrements the registry when dropped
#[derive(Debug)]
struct Registration(Arc<AtomicUsize>);

impl Drop for Registration {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A single video source within a stream
#[derive(Debug)]
pub struct VideoTrack {
    label: String,
    stop_signal: Arc<AtomicBool>,
    task: Option<AbortHandle>,
    registration: Option<Registration>,
}

impl VideoTrack {
    /// Register a new live track
    ///
    /// `stop_signal` is raised when the track stops; the producer feeding the
    /// track (a capture thread or task) must exit once it observes it.
    pub fn new(
        label: impl Into<String>,
        stop_signal: Arc<AtomicBool>,
        registry: &TrackRegistry,
    ) -> Self {
        Self {
            label: label.into(),
            stop_signal,
            task: None,
            registration: Some(registry.register()),
        }
    }

    /// Also abort this async producer when the track stops
    pub fn with_task(mut self, task: AbortHandle) -> Self {
        self.task = Some(task);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.registration.is_some()
    }

    pub fn stop(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };

        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        drop(registration);

        debug!(track = %self.label, "Track stopped");
    }
}

impl Drop for VideoTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// An acquired video source
#[derive(Debug)]
pub struct CameraStream {
    device: String,
    width: u32,
    height: u32,
    latest: LatestFrame,
    tracks: Vec<VideoTrack>,
}

impl CameraStream {
    pub fn new(
        device: impl Into<String>,
        width: u32,
        height: u32,
        latest: LatestFrame,
        tracks: Vec<VideoTrack>,
    ) -> Self {
        Self {
            device: device.into(),
            width,
            height,
            latest,
            tracks,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Native stream dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Most recent frame, if one has arrived yet
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        if !self.is_live() {
            return None;
        }
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(VideoTrack::is_live)
    }

    /// Stop every track. Safe to call repeatedly.
    pub fn stop(&mut self) {
        for track in &mut self.tracks {
            track.stop();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(registry: &TrackRegistry, signal: &Arc<AtomicBool>) -> CameraStream {
        let track = VideoTrack::new("test", signal.clone(), registry);
        CameraStream::new("test", 4, 4, LatestFrame::default(), vec![track])
    }

    #[test]
    fn test_stop_is_idempotent() {
        let registry = TrackRegistry::new();
        let signal = Arc::new(AtomicBool::new(false));
        let mut stream = stream(&registry, &signal);
        assert_eq!(registry.open_count(), 1);

        stream.stop();
        stream.stop();
        assert_eq!(registry.open_count(), 0);
        assert!(signal.load(Ordering::SeqCst));
        assert!(!stream.is_live());
    }

    #[test]
    fn test_drop_releases_tracks() {
        let registry = TrackRegistry::new();
        let signal = Arc::new(AtomicBool::new(false));
        {
            let _a = stream(&registry, &signal);
            let _b = stream(&registry, &signal);
            assert_eq!(registry.open_count(), 2);
        }
        assert_eq!(registry.open_count(), 0);
    }

    #[test]
    fn test_stopped_stream_yields_no_frames() {
        let registry = TrackRegistry::new();
        let signal = Arc::new(AtomicBool::new(false));
        let mut stream = stream(&registry, &signal);
        *stream.latest.lock().unwrap() = Some(Arc::new(CameraFrame::from_image(
            image::RgbaImage::new(4, 4),
        )));
        assert!(stream.latest_frame().is_some());

        stream.stop();
        assert!(stream.latest_frame().is_none());
    }
}
