// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture and feedback cues
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          Capture stage / Coin trigger       │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │  Feedback   │    │     Camera       │    │
//! │  │   (bell)    │    │ (V4L2 / pattern) │    │
//! │  └─────────────┘    └──────────────────┘    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera backends with device enumeration and frame streaming
//! - [`feedback`]: Audible cues for coin insertion and the shutter

pub mod camera;
pub mod feedback;
