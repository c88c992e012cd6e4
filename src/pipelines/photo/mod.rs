// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! Camera stream → Countdown → Rasterize (filter baked in) → Still
//!                                                            ↓
//!                                          Encode (PNG/JPEG) → Download
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Countdown**: 3, 2, 1, shutter icon, one step per interval
//! 2. **Rasterize**: Latest live frame through the active filter, at native
//!    resolution, on the blocking pool
//! 3. **Encoding**: PNG or JPEG of the baked pixels
//!
//! The live preview is rendered by the same filter code as the shutter.

pub mod capture;
pub mod countdown;
pub mod encoding;
pub mod processing;

pub use capture::{CaptureOutcome, CaptureStage, RejectReason, StageState, Surface};
pub use countdown::{CountdownDisplay, CountdownStep};
pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder};
pub use processing::CapturedFrame;
