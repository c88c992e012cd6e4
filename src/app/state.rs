// SPDX-License-Identifier: GPL-3.0-only

//! Session state types

use crate::filters::FilterId;
use crate::pipelines::photo::StageState;
use uuid::Uuid;

/// Which screen is visible. Exactly one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Waiting for a coin
    #[default]
    Coin,
    /// Preview, countdown and still
    Camera,
}

/// Session state machine
///
/// A projection of the capture stage's lifecycle, as seen by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session running
    #[default]
    Idle,
    /// Camera acquired (or being acquired)
    CameraActive,
    /// Countdown or shutter in progress
    Capturing,
    /// A still is shown, awaiting retake/download/new session
    Captured,
}

impl From<StageState> for SessionState {
    fn from(stage: StageState) -> Self {
        match stage {
            StageState::Inactive => SessionState::Idle,
            StageState::Acquiring | StageState::Live => SessionState::CameraActive,
            StageState::Countdown => SessionState::Capturing,
            StageState::Captured => SessionState::Captured,
        }
    }
}

/// Snapshot of the running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Random id used to correlate log lines, `None` while idle
    pub id: Option<Uuid>,
    pub state: SessionState,
    pub active_filter: FilterId,
}

/// Events delivered to the session controller from its components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The coin trigger finished settling
    PaymentAccepted,
}
