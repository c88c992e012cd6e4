// SPDX-License-Identifier: MPL-2.0

//! Rasterizing frames through a filter
//!
//! Both the live preview and the shutter go through [`FilterParams::render`],
//! so the photo matches what was on screen. Previews are downscaled first and
//! get a proportionally smaller blur radius.

use crate::backends::camera::types::CameraFrame;
use crate::filters::{FilterId, FilterParams};
use chrono::{DateTime, Local};
use image::RgbaImage;
use image::imageops;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Still image produced by one press of the shutter
///
/// Pixels have the filter baked in and are never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    image: RgbaImage,
    filter: FilterId,
    captured_at: DateTime<Local>,
}

impl CapturedFrame {
    pub fn new(image: RgbaImage, filter: FilterId, captured_at: DateTime<Local>) -> Self {
        Self {
            image,
            filter,
            captured_at,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Filter in effect when the shutter fired
    pub fn filter(&self) -> FilterId {
        self.filter
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// The still as displayed with `display_filter` layered on the baked pixels,
    /// fitted into `max_width` x `max_height`
    pub fn display(&self, display_filter: FilterId, max_width: u32, max_height: u32) -> RgbaImage {
        let (fitted, factor) = fit(&self.image, max_width, max_height);
        display_filter.params().scaled(factor).render(&fitted)
    }
}

/// Render a live frame through `filter` at native resolution
pub fn rasterize(frame: &CameraFrame, filter: FilterId) -> Option<CapturedFrame> {
    let Some(source) = frame.to_image() else {
        error!(
            width = frame.width,
            height = frame.height,
            bytes = frame.data.len(),
            "Frame buffer does not match its dimensions"
        );
        return None;
    };

    let image = filter.params().render(&source);
    debug!(filter = %filter, "Frame rasterized");
    Some(CapturedFrame::new(image, filter, Local::now()))
}

/// [`rasterize`] on the blocking pool
pub async fn rasterize_async(frame: Arc<CameraFrame>, filter: FilterId) -> Option<CapturedFrame> {
    info!(
        width = frame.width,
        height = frame.height,
        filter = %filter,
        "Rasterizing capture"
    );

    match tokio::task::spawn_blocking(move || rasterize(&frame, filter)).await {
        Ok(captured) => captured,
        Err(e) => {
            error!(error = %e, "Rasterize task failed");
            None
        }
    }
}

/// Live preview of a frame through `params`, fitted into
/// `max_width` x `max_height`
pub fn preview(
    frame: &CameraFrame,
    params: &FilterParams,
    max_width: u32,
    max_height: u32,
) -> Option<RgbaImage> {
    let source = frame.to_image()?;
    let (fitted, factor) = fit(&source, max_width, max_height);
    Some(params.scaled(factor).render(&fitted))
}

/// Downscale preserving aspect ratio. Returns the image and the scale factor.
fn fit(image: &RgbaImage, max_width: u32, max_height: u32) -> (RgbaImage, f32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (image.clone(), 1.0);
    }

    let factor = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
    let new_width = ((width as f32 * factor).round() as u32).max(1);
    let new_height = ((height as f32 * factor).round() as u32).max(1);
    (
        imageops::thumbnail(image, new_width, new_height),
        new_width as f32 / width as f32,
    )
}
