// SPDX-License-Identifier: MPL-2.0

//! Audible cues for coin insertion and the shutter

use crate::errors::FeedbackError;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Moments that get an audible cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A coin was accepted
    CoinInserted,
    /// The photo was taken
    Shutter,
}

impl Cue {
    /// Terminal bells rung for this cue
    fn bells(&self) -> usize {
        match self {
            Cue::CoinInserted => 2,
            Cue::Shutter => 1,
        }
    }
}

/// Plays cues. Failures are reported but must never be fatal to callers.
pub trait Feedback: Send + Sync {
    fn play(&self, cue: Cue) -> Result<(), FeedbackError>;
}

/// Rings the terminal bell
pub struct TerminalBell {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalBell {
    /// Bell on standard output, where the kiosk terminal is
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }
}

impl Feedback for TerminalBell {
    fn play(&self, cue: Cue) -> Result<(), FeedbackError> {
        trace!(?cue, "Ringing bell");
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&b"\x07".repeat(cue.bells()))?;
        out.flush()?;
        Ok(())
    }
}

/// Feedback for kiosks with sound switched off
#[derive(Debug, Default)]
pub struct Silent;

impl Feedback for Silent {
    fn play(&self, _cue: Cue) -> Result<(), FeedbackError> {
        Err(FeedbackError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bell_patterns() {
        let sink = Shared::default();
        let bell = TerminalBell::with_writer(sink.clone());
        bell.play(Cue::CoinInserted).unwrap();
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"\x07\x07");

        bell.play(Cue::Shutter).unwrap();
        assert_eq!(sink.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_broken_output_reports_unavailable() {
        let bell = TerminalBell::with_writer(Broken);
        assert!(matches!(
            bell.play(Cue::Shutter),
            Err(FeedbackError::Unavailable(_))
        ));
    }

    #[test]
    fn test_silent_reports_disabled() {
        assert!(matches!(
            Silent.play(Cue::CoinInserted),
            Err(FeedbackError::Disabled)
        ));
    }
}
