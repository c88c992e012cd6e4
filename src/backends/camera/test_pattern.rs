// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera producing scrolling color bars
//!
//! Runs entirely on tokio timers, so it behaves deterministically under a
//! paused test clock. It can also be told to refuse access or to take a
//! while granting it, which makes the failure paths of the session testable
//! without hardware.

use super::stream::{CameraStream, LatestFrame, TrackRegistry, VideoTrack};
use super::types::*;
use super::CameraBackend;
use crate::constants::camera::TEST_PATTERN_FPS;
use async_stream::stream;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const DEVICE_PATH: &str = "test-pattern";

/// SMPTE-style bar colors
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// Color bar camera
#[derive(Debug, Clone)]
pub struct TestPatternBackend {
    registry: TrackRegistry,
    deny_access: bool,
    acquire_delay: Duration,
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self {
            registry: TrackRegistry::new(),
            deny_access: false,
            acquire_delay: Duration::ZERO,
        }
    }

    /// A camera whose every acquisition is refused
    pub fn denied() -> Self {
        Self {
            deny_access: true,
            ..Self::new()
        }
    }

    /// Delay acquisitions, as a permission prompt would
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }
}

impl Default for TestPatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for TestPatternBackend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::TestPattern
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![CameraDevice {
            name: "Test Pattern".to_string(),
            path: DEVICE_PATH.to_string(),
            driver: None,
        }]
    }

    fn open(&self, request: &StreamRequest) -> BoxFuture<'static, BackendResult<CameraStream>> {
        let registry = self.registry.clone();
        let deny_access = self.deny_access;
        let acquire_delay = self.acquire_delay;
        let (width, height) = (request.width.max(1), request.height.max(1));

        Box::pin(async move {
            if !acquire_delay.is_zero() {
                tokio::time::sleep(acquire_delay).await;
            }
            if deny_access {
                debug!("Test pattern refusing acquisition");
                return Err(BackendError::PermissionDenied(DEVICE_PATH.to_string()));
            }

            let latest: LatestFrame =
                Arc::new(Mutex::new(Some(Arc::new(pattern_frame(width, height, 0)))));
            let stop_signal = Arc::new(AtomicBool::new(false));

            let pump = {
                let latest = latest.clone();
                let stop_signal = stop_signal.clone();
                tokio::spawn(async move {
                    let frames = pattern_frames(width, height);
                    futures::pin_mut!(frames);
                    while let Some(frame) = frames.next().await {
                        if stop_signal.load(Ordering::SeqCst) {
                            break;
                        }
                        *latest.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(Arc::new(frame));
                    }
                })
            };

            let track = VideoTrack::new(DEVICE_PATH, stop_signal, &registry)
                .with_task(pump.abort_handle());

            info!(width, height, "Test pattern streaming");
            Ok(CameraStream::new(DEVICE_PATH, width, height, latest, vec![track]))
        })
    }

    fn open_tracks(&self) -> usize {
        self.registry.open_count()
    }
}

/// Endless frame stream at the test pattern rate
fn pattern_frames(width: u32, height: u32) -> impl Stream<Item = CameraFrame> {
    stream! {
        let mut ticker = tokio::time::interval(Duration::from_millis(1000 / TEST_PATTERN_FPS));
        ticker.tick().await;
        let mut index = 1u64;
        loop {
            ticker.tick().await;
            yield pattern_frame(width, height, index);
            index = index.wrapping_add(1);
        }
    }
}

/// Color bars shifted horizontally by `index`, with a gray ramp in the
/// bottom quarter
pub fn pattern_frame(width: u32, height: u32, index: u64) -> CameraFrame {
    let bar_width = (width / BARS.len() as u32).max(1);
    let ramp_top = height - height / 4;
    let shift = (index % u64::from(width)) as u32;

    let image = RgbaImage::from_fn(width, height, |x, y| {
        if y >= ramp_top {
            let level = (x * 255 / width.max(1)) as u8;
            return Rgba([level, level, level, 255]);
        }
        let bar = (((x + shift) % width) / bar_width) as usize % BARS.len();
        let [r, g, b] = BARS[bar];
        Rgba([r, g, b, 255])
    });

    CameraFrame::from_image(image)
}
