// SPDX-License-Identifier: MPL-2.0

//! Capture stage
//!
//! Owns the camera stream, the countdown and the still produced by the
//! shutter. [`CaptureStage`] is a cheap cloneable handle; all clones share one
//! stage.
//!
//! ```text
//! Inactive ──activate──▶ Acquiring ──ok──▶ Live ──capture──▶ Countdown ──▶ Captured
//!    ▲                      │                ▲                              │
//!    │                    error              └────────── retake ────────────┘
//!    └──────────────────────┴──────────── deactivate (from any state) ──────┘
//! ```
//!
//! Every teardown bumps an epoch. Operations that suspend (acquisition, the
//! countdown, rasterizing) note the epoch they started in and drop their
//! result if it changed by the time they resume.

use super::countdown::{CountdownDisplay, CountdownStep};
use super::encoding::{EncodedImage, PhotoEncoder};
use super::processing::{self, CapturedFrame};
use crate::backends::camera::{CameraBackend, CameraStream, StreamRequest};
use crate::backends::feedback::{Cue, Feedback};
use crate::constants::timing::COUNTDOWN_STEP;
use crate::errors::{CaptureError, ExportError, FeedbackError};
use crate::filters::FilterId;
use image::RgbaImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle state of the capture stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No stream held
    Inactive,
    /// Waiting for the camera to grant access
    Acquiring,
    /// Streaming, ready to capture
    Live,
    /// Countdown running or shutter being rasterized
    Countdown,
    /// A still is shown
    Captured,
}

/// What the stage currently presents
#[derive(Debug, Clone)]
pub enum Surface {
    Hidden,
    Live {
        width: u32,
        height: u32,
        filter: FilterId,
    },
    Still {
        frame: Arc<CapturedFrame>,
        /// Filter the still is displayed with. Starts as the baked filter and
        /// follows later selections; the frame itself never changes.
        display_filter: FilterId,
    },
}

/// Why a capture request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A capture is already in progress
    Busy,
    /// The stage is not streaming
    NotLive,
}

/// Result of [`CaptureStage::capture`]
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Captured(Arc<CapturedFrame>),
    Rejected(RejectReason),
    /// The stage was torn down during the countdown
    Abandoned,
    /// The stream had no usable frame at the shutter instant
    NoFrame,
}

#[derive(Debug)]
struct StillView {
    frame: Arc<CapturedFrame>,
    display_filter: FilterId,
}

#[derive(Debug)]
struct StageInner {
    state: StageState,
    epoch: u64,
    stream: Option<CameraStream>,
    live_filter: FilterId,
    still: Option<StillView>,
    countdown: Option<CountdownDisplay>,
}

/// Camera stream, countdown and still, behind one lock
#[derive(Clone)]
pub struct CaptureStage {
    backend: Arc<dyn CameraBackend>,
    feedback: Arc<dyn Feedback>,
    request: StreamRequest,
    countdown_step: Duration,
    encoder: PhotoEncoder,
    inner: Arc<Mutex<StageInner>>,
}

impl CaptureStage {
    pub fn new(backend: Arc<dyn CameraBackend>, feedback: Arc<dyn Feedback>) -> Self {
        Self {
            backend,
            feedback,
            request: StreamRequest::default(),
            countdown_step: COUNTDOWN_STEP,
            encoder: PhotoEncoder::new(),
            inner: Arc::new(Mutex::new(StageInner {
                state: StageState::Inactive,
                epoch: 0,
                stream: None,
                live_filter: FilterId::None,
                still: None,
                countdown: None,
            })),
        }
    }

    pub fn with_request(mut self, request: StreamRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_countdown_step(mut self, step: Duration) -> Self {
        self.countdown_step = step;
        self
    }

    pub fn with_encoder(mut self, encoder: PhotoEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    fn lock(&self) -> MutexGuard<'_, StageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the camera and go live
    ///
    /// Returns the native stream size. On failure the stage stays
    /// `Inactive`; nothing is retried.
    pub async fn activate(&self) -> Result<(u32, u32), CaptureError> {
        let epoch = {
            let mut inner = self.lock();
            if inner.state != StageState::Inactive {
                return Err(CaptureError::AlreadyActive);
            }
            inner.state = StageState::Acquiring;
            inner.epoch
        };

        info!(
            backend = %self.backend.backend_type(),
            width = self.request.width,
            height = self.request.height,
            "Acquiring camera"
        );
        let result = self.backend.open(&self.request).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            if let Ok(mut stream) = result {
                stream.stop();
            }
            debug!("Stage torn down during acquisition, dropping stream");
            return Err(CaptureError::Superseded);
        }

        match result {
            Ok(stream) => {
                let (width, height) = stream.dimensions();
                info!(device = stream.device(), width, height, "Camera live");
                inner.stream = Some(stream);
                inner.state = StageState::Live;
                Ok((width, height))
            }
            Err(e) => {
                warn!(error = %e, "Camera acquisition failed");
                inner.state = StageState::Inactive;
                Err(CaptureError::AcquisitionDenied(e))
            }
        }
    }

    /// Run the countdown and take a photo through the live filter
    pub async fn capture(&self) -> CaptureOutcome {
        let epoch = {
            let mut inner = self.lock();
            match inner.state {
                StageState::Live => {}
                StageState::Countdown => return CaptureOutcome::Rejected(RejectReason::Busy),
                _ => return CaptureOutcome::Rejected(RejectReason::NotLive),
            }
            inner.state = StageState::Countdown;
            inner.epoch
        };
        let _guard = CountdownGuard { stage: self, epoch };

        for (index, step) in CountdownStep::SEQUENCE.into_iter().enumerate() {
            {
                let mut inner = self.lock();
                if inner.epoch != epoch {
                    return CaptureOutcome::Abandoned;
                }
                inner.countdown = Some(CountdownDisplay {
                    step,
                    pulse: index as u32 + 1,
                    started_at: Instant::now(),
                });
            }
            debug!(step = step.label(), "Countdown");
            tokio::time::sleep(self.countdown_step).await;
        }

        // Shutter: the filter is read at this instant and nowhere else
        let (frame, filter) = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return CaptureOutcome::Abandoned;
            }
            inner.countdown = None;
            let frame = inner.stream.as_ref().and_then(CameraStream::latest_frame);
            match frame {
                Some(frame) => (frame, inner.live_filter),
                None => {
                    warn!("No frame available at shutter");
                    return CaptureOutcome::NoFrame;
                }
            }
        };

        let rasterized = processing::rasterize_async(frame, filter).await;

        let captured = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return CaptureOutcome::Abandoned;
            }
            let Some(captured) = rasterized else {
                return CaptureOutcome::NoFrame;
            };
            let captured = Arc::new(captured);
            let display_filter = inner.live_filter;
            inner.still = Some(StillView {
                frame: captured.clone(),
                display_filter,
            });
            inner.state = StageState::Captured;
            captured
        };

        match self.feedback.play(Cue::Shutter) {
            Ok(()) | Err(FeedbackError::Disabled) => {}
            Err(e) => warn!(error = %e, "Shutter sound unavailable"),
        }
        info!(filter = %filter, "Photo captured");
        CaptureOutcome::Captured(captured)
    }

    /// Discard the still and return to the live stream
    pub fn retake(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != StageState::Captured {
            return false;
        }
        inner.still = None;
        inner.state = StageState::Live;
        debug!("Retake");
        true
    }

    /// Encode a captured frame for download. Does not touch the stage.
    pub fn export(&self, frame: &CapturedFrame) -> Result<EncodedImage, ExportError> {
        self.encoder.encode(frame)
    }

    /// Stop the stream and forget everything. Safe to call repeatedly.
    pub fn deactivate(&self) {
        let stream = {
            let mut inner = self.lock();
            inner.epoch = inner.epoch.wrapping_add(1);
            inner.state = StageState::Inactive;
            inner.still = None;
            inner.countdown = None;
            inner.stream.take()
        };

        if let Some(mut stream) = stream {
            stream.stop();
            info!(device = stream.device(), "Camera released");
        }
    }

    /// Change the live filter; a shown still is restyled but keeps its pixels
    pub fn set_filter(&self, filter: impl Into<FilterId>) -> FilterId {
        let filter = filter.into();
        let mut inner = self.lock();
        inner.live_filter = filter;
        if let Some(still) = inner.still.as_mut() {
            still.display_filter = filter;
        }
        filter
    }

    pub fn state(&self) -> StageState {
        self.lock().state
    }

    pub fn live_filter(&self) -> FilterId {
        self.lock().live_filter
    }

    pub fn countdown(&self) -> Option<CountdownDisplay> {
        self.lock().countdown
    }

    pub fn countdown_step(&self) -> Duration {
        self.countdown_step
    }

    /// The current still, if one is shown
    pub fn captured_frame(&self) -> Option<Arc<CapturedFrame>> {
        self.lock().still.as_ref().map(|still| still.frame.clone())
    }

    /// Whether a stream is held
    pub fn has_stream(&self) -> bool {
        self.lock().stream.is_some()
    }

    /// Live tracks still open on the backend
    pub fn open_tracks(&self) -> usize {
        self.backend.open_tracks()
    }

    pub fn surface(&self) -> Surface {
        let inner = self.lock();
        if let Some(still) = inner.still.as_ref() {
            return Surface::Still {
                frame: still.frame.clone(),
                display_filter: still.display_filter,
            };
        }
        match inner.stream.as_ref() {
            Some(stream) => {
                let (width, height) = stream.dimensions();
                Surface::Live {
                    width,
                    height,
                    filter: inner.live_filter,
                }
            }
            None => Surface::Hidden,
        }
    }

    /// Render what the surface shows, fitted into `max_width` x `max_height`
    pub fn render_surface(&self, max_width: u32, max_height: u32) -> Option<RgbaImage> {
        match self.surface() {
            Surface::Hidden => None,
            Surface::Still {
                frame,
                display_filter,
            } => Some(frame.display(display_filter, max_width, max_height)),
            Surface::Live { filter, .. } => {
                let frame = self
                    .lock()
                    .stream
                    .as_ref()
                    .and_then(CameraStream::latest_frame)?;
                processing::preview(&frame, &filter.params(), max_width, max_height)
            }
        }
    }
}

/// Returns the stage to `Live` if a capture exits early or is dropped
/// mid-countdown
struct CountdownGuard<'a> {
    stage: &'a CaptureStage,
    epoch: u64,
}

impl Drop for CountdownGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.stage.lock();
        if inner.epoch == self.epoch && inner.state == StageState::Countdown {
            inner.state = StageState::Live;
            inner.countdown = None;
        }
    }
}
