// SPDX-License-Identifier: GPL-3.0-only

//! Pre-shutter countdown

use std::time::Duration;
use tokio::time::Instant;

/// One step of the countdown shown before the shutter fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Three,
    Two,
    One,
    Shutter,
}

impl CountdownStep {
    /// Steps in display order, one per countdown interval
    pub const SEQUENCE: [CountdownStep; 4] = [
        CountdownStep::Three,
        CountdownStep::Two,
        CountdownStep::One,
        CountdownStep::Shutter,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CountdownStep::Three => "3",
            CountdownStep::Two => "2",
            CountdownStep::One => "1",
            CountdownStep::Shutter => "📸",
        }
    }
}

/// What the countdown overlay currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownDisplay {
    pub step: CountdownStep,
    /// Bumped on every step so the renderer restarts its pulse animation
    pub pulse: u32,
    pub started_at: Instant,
}

impl CountdownDisplay {
    /// Progress of the pulse animation of this step, from 0.0 to 1.0
    pub fn pulse_progress(&self, step_duration: Duration, now: Instant) -> f32 {
        if step_duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / step_duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}
