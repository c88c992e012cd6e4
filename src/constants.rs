// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Camera acquisition constants
pub mod camera {
    /// Preferred capture width requested from the camera
    pub const PREFERRED_WIDTH: u32 = 1280;

    /// Preferred capture height requested from the camera
    pub const PREFERRED_HEIGHT: u32 = 720;

    /// Number of mmap buffers queued on V4L2 devices
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Frame rate of the synthetic test pattern
    pub const TEST_PATTERN_FPS: u64 = 30;
}

/// Session timing defaults
pub mod timing {
    use super::Duration;

    /// Delay between a coin trigger and the payment-accepted callback
    pub const COIN_SETTLE: Duration = Duration::from_millis(1000);

    /// Duration of each countdown step (3, 2, 1, shutter)
    pub const COUNTDOWN_STEP: Duration = Duration::from_millis(1000);

    /// Display + fade time of a filter notification
    pub const TOAST: Duration = Duration::from_millis(2000);

    /// Fraction of a toast's lifetime spent sliding in (and again sliding out)
    pub const TOAST_SLIDE_FRACTION: f32 = 0.15;
}

/// Export naming
pub mod export {
    /// Prefix of downloaded photo filenames
    pub const FILENAME_PREFIX: &str = "photobooth";

    /// Subdirectory created under the user's download directory
    pub const DEFAULT_SUBDIRECTORY: &str = "Photobooth";

    /// JPEG quality used when exporting as JPEG
    pub const JPEG_QUALITY: u8 = 92;
}

/// Terminal front-end constants
pub mod ui {
    use super::Duration;

    /// Redraw/input polling interval of the kiosk loop
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Width of the filter notification box (in cells)
    pub const TOAST_WIDTH: u16 = 28;

    /// Frames of the idle coin spin animation
    pub const COIN_SPIN: [&str; 4] = ["◐", "◓", "◑", "◒"];

    /// How many redraws each coin spin frame is shown for
    pub const COIN_SPIN_DIVISOR: u64 = 8;
}
