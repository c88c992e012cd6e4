// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! Heavy per-pixel work (rasterizing a capture, encoding a download) runs on
//! tokio's blocking pool so timers and input keep running.
//!
//! # Modules
//!
//! - [`photo`]: Countdown, filtered capture and photo encoding

pub mod photo;
