// SPDX-License-Identifier: GPL-3.0-only

//! Structured filter parameters and the CPU renderer that consumes them
//!
//! A filter is an ordered chain of filter-effect primitives. The amounts live
//! in named fields; [`FilterParams::order`] says in which sequence they run,
//! e.g. rainbow is `hue-rotate → saturate → contrast`:
//!
//! ```text
//! order:  [HueRotate, Saturate, Contrast]
//! pixel ──▶ hue_rotate_deg ──▶ saturation ──▶ contrast ──▶ pixel
//! ```
//!
//! Color steps work on normalized sRGB values and clamp to `[0, 1]` after
//! each primitive, using the standard filter-effects color matrices.

use image::RgbaImage;

/// Rec. 709 luma weights used by the saturate/hue-rotate matrices
const LUMA: [f32; 3] = [0.213, 0.715, 0.072];

/// One primitive of a filter chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStep {
    Blur,
    Sepia,
    Grayscale,
    Contrast,
    Brightness,
    Saturate,
    HueRotate,
}

impl FilterStep {
    /// Sequence used when a record is built without an explicit order
    pub const CANONICAL: &'static [FilterStep] = &[
        FilterStep::Blur,
        FilterStep::Sepia,
        FilterStep::Grayscale,
        FilterStep::Contrast,
        FilterStep::Brightness,
        FilterStep::Saturate,
        FilterStep::HueRotate,
    ];
}

/// Intensity parameters of a filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Sepia amount (0 = none, 1 = full)
    pub sepia: f32,
    /// Grayscale amount (0 = none, 1 = full)
    pub grayscale: f32,
    /// Contrast multiplier around mid-gray (1 = unchanged)
    pub contrast: f32,
    /// Brightness multiplier (1 = unchanged)
    pub brightness: f32,
    /// Saturation multiplier (1 = unchanged)
    pub saturation: f32,
    /// Hue rotation in degrees
    pub hue_rotate_deg: f32,
    /// Gaussian blur standard deviation in pixels
    pub blur_radius: f32,
    /// Order the primitives run in. Steps at their neutral value are skipped.
    pub order: &'static [FilterStep],
}

impl FilterParams {
    /// Parameters that leave an image untouched
    pub const IDENTITY: FilterParams = FilterParams {
        sepia: 0.0,
        grayscale: 0.0,
        contrast: 1.0,
        brightness: 1.0,
        saturation: 1.0,
        hue_rotate_deg: 0.0,
        blur_radius: 0.0,
        order: FilterStep::CANONICAL,
    };

    /// True if no step changes a pixel, whatever the order
    pub fn is_identity(&self) -> bool {
        FilterStep::CANONICAL.iter().all(|step| self.is_neutral(*step))
    }

    fn is_neutral(&self, step: FilterStep) -> bool {
        match step {
            FilterStep::Blur => self.blur_radius <= 0.0,
            FilterStep::Sepia => self.sepia <= 0.0,
            FilterStep::Grayscale => self.grayscale <= 0.0,
            FilterStep::Contrast => self.contrast == 1.0,
            FilterStep::Brightness => self.brightness == 1.0,
            FilterStep::Saturate => self.saturation == 1.0,
            FilterStep::HueRotate => self.hue_rotate_deg.rem_euclid(360.0) == 0.0,
        }
    }

    /// Same transform for an image rendered at `factor` times the native size.
    ///
    /// Only the blur radius depends on the pixel grid; color steps are
    /// resolution independent.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            blur_radius: self.blur_radius * factor,
            ..*self
        }
    }

    /// Apply the color steps to one pixel, in chain order
    pub fn apply_rgb(&self, rgb: [u8; 3]) -> [u8; 3] {
        self.apply_steps(self.order, rgb)
    }

    fn apply_steps(&self, steps: &[FilterStep], rgb: [u8; 3]) -> [u8; 3] {
        let mut c = rgb.map(|v| f32::from(v) / 255.0);

        for step in steps.iter().copied().filter(|step| !self.is_neutral(*step)) {
            c = match step {
                // Spatial, handled by render()
                FilterStep::Blur => c,
                FilterStep::Sepia => mat_mul(&sepia_matrix(self.sepia), c),
                FilterStep::Grayscale => mat_mul(&grayscale_matrix(self.grayscale), c),
                FilterStep::Contrast => {
                    c.map(|v| ((v - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0))
                }
                FilterStep::Brightness => c.map(|v| (v * self.brightness).clamp(0.0, 1.0)),
                FilterStep::Saturate => mat_mul(&saturate_matrix(self.saturation), c),
                FilterStep::HueRotate => mat_mul(&hue_rotate_matrix(self.hue_rotate_deg), c),
            };
        }

        c.map(|v| (v * 255.0).round() as u8)
    }

    /// Render an image through this filter. Alpha is preserved.
    ///
    /// Color steps between two blurs are applied per pixel; a blur runs over
    /// the whole image at its place in the chain.
    pub fn render(&self, source: &RgbaImage) -> RgbaImage {
        let mut output = source.clone();
        if self.is_identity() {
            return output;
        }

        for (index, steps) in self.order.split(|step| *step == FilterStep::Blur).enumerate() {
            if index > 0 && self.blur_radius > 0.0 {
                output = image::imageops::blur(&output, self.blur_radius);
            }
            if steps.iter().all(|step| self.is_neutral(*step)) {
                continue;
            }
            for pixel in output.pixels_mut() {
                let [r, g, b] = self.apply_steps(steps, [pixel[0], pixel[1], pixel[2]]);
                pixel[0] = r;
                pixel[1] = g;
                pixel[2] = b;
            }
        }

        output
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

type Matrix = [[f32; 3]; 3];

#[inline]
fn mat_mul(m: &Matrix, c: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (row, value) in m.iter().zip(out.iter_mut()) {
        *value = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 1.0);
    }
    out
}

fn sepia_matrix(amount: f32) -> Matrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn saturate_matrix(s: f32) -> Matrix {
    let [lr, lg, lb] = LUMA;
    [
        [lr + (1.0 - lr) * s, lg - lg * s, lb - lb * s],
        [lr - lr * s, lg + (1.0 - lg) * s, lb - lb * s],
        [lr - lr * s, lg - lg * s, lb + (1.0 - lb) * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}
