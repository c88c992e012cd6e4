// SPDX-License-Identifier: MPL-2.0

//! Photobooth session
//!
//! [`SessionController`] owns the components of a booth and is the only
//! place screens change:
//!
//! ```text
//! CoinTrigger ──PaymentAccepted──▶ SessionController ──activate──▶ CaptureStage
//!                                         │                          ▲
//!                                         └──select──▶ FilterSelector ┘
//! ```
//!
//! # Architecture
//!
//! - `state`: Screen, session state and event types
//! - `coin`: Coin slot with settle delay
//! - `filter_selector`: Active filter and its propagation
//! - `notifications`: Transient toasts
//! - `input`: Key bindings of the kiosk
//!
//! Operations that suspend for a long time (acquisition, capture, download)
//! come in a form returning a `'static` future, so a front-end can keep
//! handling input while they run.

pub mod coin;
pub mod filter_selector;
pub mod input;
pub mod notifications;
pub mod state;

pub use coin::{CoinTrigger, CoinVisual};
pub use filter_selector::{FilterSelector, FilterTarget};
pub use input::{InputContext, KioskAction, map_key};
pub use notifications::{Toast, Toasts};
pub use state::{Screen, Session, SessionEvent, SessionState};

use crate::backends::camera::CameraBackend;
use crate::backends::feedback::Feedback;
use crate::config::Config;
use crate::errors::{CaptureError, ExportError};
use crate::filters::FilterId;
use crate::fl;
use crate::pipelines::photo::{
    CaptureOutcome, CaptureStage, CapturedFrame, PhotoEncoder, RejectReason,
};
use crate::storage;
use futures::future::BoxFuture;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Receiving end of the events the controller's components emit
pub struct SessionEvents {
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
    /// Wait for the next event
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is queued
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Camera acquisition in flight
pub type Activation = BoxFuture<'static, Result<(u32, u32), CaptureError>>;

pub struct SessionController {
    screen: Screen,
    session_id: Option<Uuid>,
    stage: CaptureStage,
    selector: FilterSelector,
    coin: CoinTrigger,
    toasts: Toasts,
    toast_duration: Duration,
    alert: Option<String>,
    export_dir: PathBuf,
}

impl SessionController {
    pub fn new(
        config: &Config,
        backend: Arc<dyn CameraBackend>,
        feedback: Arc<dyn Feedback>,
    ) -> (Self, SessionEvents) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let stage = CaptureStage::new(backend, feedback.clone())
            .with_request(config.camera.stream_request())
            .with_countdown_step(config.timing.countdown_step())
            .with_encoder(PhotoEncoder::new().with_format(config.export.format));

        let toasts = Toasts::new();
        let selector = FilterSelector::new(Arc::new(stage.clone()), toasts.clone())
            .with_toast_duration(config.timing.toast());

        let mut coin = CoinTrigger::new(feedback).with_settle(config.timing.settle());
        coin.on_accept(move || {
            if sender.send(SessionEvent::PaymentAccepted).is_err() {
                debug!("Session controller gone, dropping payment");
            }
        });

        let controller = Self {
            screen: Screen::Coin,
            session_id: None,
            stage,
            selector,
            coin,
            toasts,
            toast_duration: config.timing.toast(),
            alert: None,
            export_dir: config.export.directory(),
        };

        (controller, SessionEvents { receiver })
    }

    /// Coin slot pressed. Only works on the coin screen.
    pub fn insert_coin(&mut self) -> bool {
        if self.screen != Screen::Coin || self.alert.is_some() {
            return false;
        }
        self.coin.trigger()
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PaymentAccepted => self.on_payment_accepted().await,
        }
    }

    /// Switch to the camera screen and acquire the camera
    pub async fn on_payment_accepted(&mut self) {
        if let Some(activation) = self.begin_session() {
            let result = activation.await;
            self.finish_activation(result);
        }
    }

    /// First half of [`on_payment_accepted`](Self::on_payment_accepted):
    /// switches screens and returns the acquisition to drive
    pub fn begin_session(&mut self) -> Option<Activation> {
        if self.screen == Screen::Camera {
            debug!("Payment accepted while a session is running, ignoring");
            return None;
        }

        let id = Uuid::new_v4();
        self.session_id = Some(id);
        self.screen = Screen::Camera;
        info!(session = %id, "Session started");

        let stage = self.stage.clone();
        Some(Box::pin(async move { stage.activate().await }))
    }

    /// Second half of [`on_payment_accepted`](Self::on_payment_accepted)
    pub fn finish_activation(&mut self, result: Result<(u32, u32), CaptureError>) {
        match result {
            Ok((width, height)) => {
                info!(session = ?self.session_id, width, height, "Camera ready");
            }
            Err(CaptureError::AcquisitionDenied(e)) => {
                warn!(session = ?self.session_id, error = %e, "Could not access camera");
                self.alert = Some(fl!("camera-access-denied"));
                self.end_session();
            }
            Err(e) => debug!(error = %e, "Activation did not complete"),
        }
    }

    /// Countdown and shutter
    ///
    /// The returned future does not borrow the controller; a no-op unless the
    /// camera screen is live.
    pub fn capture(&self) -> impl Future<Output = CaptureOutcome> + Send + 'static {
        let stage = self.stage.clone();
        let on_camera = self.screen == Screen::Camera;
        let session = self.session_id;
        async move {
            if !on_camera {
                return CaptureOutcome::Rejected(RejectReason::NotLive);
            }
            let outcome = stage.capture().await;
            debug!(session = ?session, outcome = ?outcome, "Capture finished");
            outcome
        }
    }

    /// Back to the live stream from a still
    pub fn retake(&mut self) -> bool {
        self.screen == Screen::Camera && self.stage.retake()
    }

    /// Select a filter. Only works on the camera screen.
    pub fn select_filter(&mut self, filter: impl Into<FilterId>) -> Option<FilterId> {
        if self.screen != Screen::Camera {
            return None;
        }
        Some(self.selector.select(filter))
    }

    /// Encode the shown still and save it to the export directory
    ///
    /// Posts a toast with the outcome. The photo is written exactly as baked
    /// at capture time.
    pub fn download(&self) -> impl Future<Output = Result<PathBuf, ExportError>> + Send + 'static {
        let stage = self.stage.clone();
        let frame = if self.screen == Screen::Camera {
            stage.captured_frame()
        } else {
            None
        };
        let export_dir = self.export_dir.clone();
        let toasts = self.toasts.clone();
        let toast_duration = self.toast_duration;

        async move {
            let result = export_still(stage, frame, &export_dir).await;

            match &result {
                Ok(path) => {
                    let path = path.display().to_string();
                    toasts.push(fl!("photo-saved", path = path), toast_duration);
                }
                Err(e) => {
                    error!(error = %e, "Download failed");
                    let error = e.to_string();
                    toasts.push(fl!("photo-save-failed", error = error), toast_duration);
                }
            }
            result
        }
    }

    /// Tear everything down and return to the coin screen
    ///
    /// Safe from any state and safe to repeat.
    pub fn end_session(&mut self) {
        self.stage.deactivate();
        self.screen = Screen::Coin;
        self.selector.reset();
        self.coin.reset();
        if let Some(id) = self.session_id.take() {
            info!(session = %id, "Session ended");
        }
    }

    pub fn dismiss_alert(&mut self) -> bool {
        self.alert.take().is_some()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> Session {
        Session {
            id: self.session_id,
            state: self.stage.state().into(),
            active_filter: self.selector.active(),
        }
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn stage(&self) -> &CaptureStage {
        &self.stage
    }

    pub fn coin_visual(&self) -> CoinVisual {
        self.coin.visual()
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn input_context(&self) -> InputContext {
        InputContext {
            screen: self.screen,
            state: self.session().state,
            alert_visible: self.alert.is_some(),
        }
    }
}

async fn export_still(
    stage: CaptureStage,
    frame: Option<Arc<CapturedFrame>>,
    export_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let frame = frame.ok_or(ExportError::NothingCaptured)?;
    let encoded = tokio::task::spawn_blocking(move || stage.export(&frame))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))??;
    storage::save(encoded, export_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::TestPatternBackend;
    use crate::backends::feedback::Silent;

    fn controller(backend: TestPatternBackend) -> (SessionController, SessionEvents) {
        let mut config = Config::default();
        config.camera.width = 32;
        config.camera.height = 18;
        SessionController::new(&config, Arc::new(backend), Arc::new(Silent))
    }

    #[tokio::test(start_paused = true)]
    async fn test_coin_leads_to_camera() {
        let (mut controller, mut events) = controller(TestPatternBackend::new());
        assert!(controller.insert_coin());
        assert_eq!(controller.coin_visual(), CoinVisual::Inserted);

        let event = events.next().await.unwrap();
        controller.handle_event(event).await;

        assert_eq!(controller.screen(), Screen::Camera);
        let session = controller.session();
        assert!(session.id.is_some());
        assert_eq!(session.state, SessionState::CameraActive);
        assert!(!controller.insert_coin());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_only_on_camera_screen() {
        let (mut controller, _events) = controller(TestPatternBackend::new());
        assert_eq!(controller.select_filter("neon"), None);
        assert_eq!(controller.session().active_filter, FilterId::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_rejected_on_coin_screen() {
        let (controller, _events) = controller(TestPatternBackend::new());
        assert!(matches!(
            controller.capture().await,
            CaptureOutcome::Rejected(RejectReason::NotLive)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_without_still() {
        let (controller, _events) = controller(TestPatternBackend::new());
        assert!(matches!(
            controller.download().await,
            Err(ExportError::NothingCaptured)
        ));
        assert_eq!(controller.toasts().len(), 1);
    }
}
