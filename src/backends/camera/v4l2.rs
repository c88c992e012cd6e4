// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 Camera Backend
//!
//! Streams from a `/dev/video*` capture node through memory-mapped buffers.
//! MJPG is requested first since most USB webcams only reach 1280x720 at a
//! usable rate when compressed; YUYV is the fallback.
//!
//! Capture runs on a dedicated thread. It reports the negotiated size back to
//! the awaiting `open` future once streaming started, then keeps replacing
//! the stream's latest frame until the track's stop signal is raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use futures::future::BoxFuture;
use image::ImageFormat;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

use super::stream::{CameraStream, LatestFrame, TrackRegistry, VideoTrack};
use super::types::*;
use super::CameraBackend;
use crate::constants::camera::V4L2_BUFFER_COUNT;

/// Pixel formats we can decode, in order of preference
const SUPPORTED_FOURCCS: [&[u8; 4]; 2] = [b"MJPG", b"YUYV"];

/// V4L2 capture backend
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    registry: TrackRegistry,
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CameraBackend for V4l2Backend {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut paths: Vec<String> = std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|n| n.starts_with("video"))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_string_lossy().to_string())
            .collect();
        paths.sort();

        let mut cameras = Vec::new();
        for path in paths {
            let dev = match Device::with_path(&path) {
                Ok(dev) => dev,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping video node");
                    continue;
                }
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            // Metadata nodes share the card name but cannot capture
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                continue;
            }

            cameras.push(CameraDevice {
                name: caps.card.clone(),
                path,
                driver: Some(caps.driver.clone()),
            });
        }

        debug!(count = cameras.len(), "Enumerated V4L2 cameras");
        cameras
    }

    fn open(&self, request: &StreamRequest) -> BoxFuture<'static, BackendResult<CameraStream>> {
        let backend = self.clone();
        let request = request.clone();

        Box::pin(async move {
            let path = match request.device {
                Some(path) => path,
                None => backend
                    .enumerate_cameras()
                    .into_iter()
                    .next()
                    .map(|camera| camera.path)
                    .ok_or_else(|| BackendError::DeviceNotFound("no capture device".into()))?,
            };

            let stop_signal = Arc::new(AtomicBool::new(false));
            let latest: LatestFrame = Arc::new(Mutex::new(None));
            let (ready_tx, ready_rx) = oneshot::channel();

            {
                let path = path.clone();
                let stop_signal = stop_signal.clone();
                let latest = latest.clone();
                let (width, height) = (request.width, request.height);
                thread::Builder::new()
                    .name("v4l2-capture".into())
                    .spawn(move || {
                        capture_loop(&path, width, height, stop_signal, latest, ready_tx)
                    })
                    .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
            }

            let (width, height) = ready_rx.await.map_err(|_| {
                BackendError::InitializationFailed("capture thread exited".into())
            })??;

            let track = VideoTrack::new(path.clone(), stop_signal, &backend.registry);
            Ok(CameraStream::new(path, width, height, latest, vec![track]))
        })
    }

    fn open_tracks(&self) -> usize {
        self.registry.open_count()
    }
}

/// Capture loop running in a separate thread
fn capture_loop(
    path: &str,
    width: u32,
    height: u32,
    stop_signal: Arc<AtomicBool>,
    latest: LatestFrame,
    ready: oneshot::Sender<BackendResult<(u32, u32)>>,
) {
    info!(path, width, height, "Starting V4L2 capture");

    let (mut stream, format) = match start_stream(path, width, height) {
        Ok(started) => started,
        Err(e) => {
            error!(path, error = %e, "Failed to start V4L2 capture");
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok((format.width, format.height))).is_err() {
        debug!(path, "Acquisition abandoned before streaming");
        return;
    }

    let mjpg = format.fourcc == FourCC::new(b"MJPG");

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to capture frame");
                continue;
            }
        };

        let used = (meta.bytesused as usize).min(buf.len());
        let data = if used == 0 { buf } else { &buf[..used] };

        let frame = if mjpg {
            match image::load_from_memory_with_format(data, ImageFormat::Jpeg) {
                Ok(decoded) => CameraFrame::from_image(decoded.to_rgba8()),
                Err(e) => {
                    // Some webcams emit a few truncated JPEGs after stream-on
                    debug!(error = %e, "Dropping undecodable MJPG frame");
                    continue;
                }
            }
        } else {
            let rgba = yuyv_to_rgba(data, format.width, format.height);
            CameraFrame {
                width: format.width,
                height: format.height,
                data: Arc::from(rgba),
                captured_at: std::time::Instant::now(),
            }
        };

        *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(frame));
    }

    info!(path, "V4L2 capture loop stopped");
}

/// Open the device, negotiate a decodable format and start streaming
fn start_stream(path: &str, width: u32, height: u32) -> BackendResult<(Stream<'static>, Format)> {
    let dev = Device::with_path(path).map_err(|e| BackendError::from_io(path, &e))?;

    let mut negotiated = None;
    for fourcc in SUPPORTED_FOURCCS {
        let wanted = FourCC::new(fourcc);
        match dev.set_format(&Format::new(width, height, wanted)) {
            Ok(actual) if actual.fourcc == wanted => {
                negotiated = Some(actual);
                break;
            }
            Ok(actual) => debug!(requested = ?wanted, got = ?actual.fourcc, "Driver substituted format"),
            Err(e) => debug!(requested = ?wanted, error = %e, "Format rejected"),
        }
    }
    let format = negotiated.ok_or_else(|| {
        BackendError::FormatNotSupported(format!("{}: neither MJPG nor YUYV", path))
    })?;

    info!(
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "V4L2 format configured"
    );

    let stream = Stream::with_buffers(&dev, Type::VideoCapture, V4L2_BUFFER_COUNT)
        .map_err(|e| BackendError::from_io(path, &e))?;

    Ok((stream, format))
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    // Short buffers are padded black so the frame keeps its dimensions
    rgba.resize(pixel_count * 4, 0);
    rgba
}
