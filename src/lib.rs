// SPDX-License-Identifier: MPL-2.0

//! Photobooth - A coin-operated photobooth kiosk
//!
//! This library provides the session logic of the booth: the coin slot, the
//! camera stream with its live filter, the countdown and shutter, and saving
//! the resulting photo.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session controller, coin slot, filter selection and toasts
//! - [`backends`]: Camera and feedback backend abstraction
//! - [`filters`]: The filter catalogue and pixel rendering
//! - [`pipelines`]: Countdown, shutter and photo encoding
//! - [`config`]: User configuration handling
//! - [`storage`]: Writing photos to disk
//! - [`terminal`]: The terminal kiosk front-end
//!
//! # Example
//!
//! ```ignore
//! // The kiosk is typically run via:
//! // photobooth --backend test-pattern
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod i18n;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Screen, Session, SessionController, SessionEvent, SessionState};
pub use config::Config;
pub use filters::FilterId;
