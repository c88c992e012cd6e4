// SPDX-License-Identifier: GPL-3.0-only

//! Coin slot
//!
//! One coin yields one "payment accepted" callback, fired after a settle
//! delay during which the slot shows the inserted state.

use crate::backends::feedback::{Cue, Feedback};
use crate::constants::timing::COIN_SETTLE;
use crate::errors::FeedbackError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the coin slot shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoinVisual {
    /// Spinning coin, prompt to insert
    #[default]
    Waiting,
    /// Coin dropped, session starting
    Inserted,
}

type AcceptCallback = Arc<dyn Fn() + Send + Sync>;

pub struct CoinTrigger {
    settle: Duration,
    feedback: Arc<dyn Feedback>,
    callback: Option<AcceptCallback>,
    visual: CoinVisual,
    pending: Option<JoinHandle<()>>,
}

impl CoinTrigger {
    pub fn new(feedback: Arc<dyn Feedback>) -> Self {
        Self {
            settle: COIN_SETTLE,
            feedback,
            callback: None,
            visual: CoinVisual::Waiting,
            pending: None,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Register the payment-accepted callback, replacing any earlier one
    pub fn on_accept(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.callback = Some(Arc::new(callback));
    }

    /// A coin went in
    ///
    /// Feedback plays right away; the callback runs once after the settle
    /// delay. Returns `false` if a previous coin is still settling.
    pub fn trigger(&mut self) -> bool {
        if self.is_settling() {
            debug!("Coin ignored, previous coin still settling");
            return false;
        }

        self.visual = CoinVisual::Inserted;
        match self.feedback.play(Cue::CoinInserted) {
            Ok(()) | Err(FeedbackError::Disabled) => {}
            Err(e) => warn!(error = %e, "Coin sound unavailable"),
        }

        let callback = self.callback.clone();
        let settle = self.settle;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            match callback {
                Some(callback) => {
                    info!("Payment accepted");
                    callback();
                }
                None => warn!("Coin accepted with no listener"),
            }
        }));
        true
    }

    /// Restore the idle slot
    pub fn reset(&mut self) {
        self.visual = CoinVisual::Waiting;
    }

    pub fn visual(&self) -> CoinVisual {
        self.visual
    }

    pub fn is_settling(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}
