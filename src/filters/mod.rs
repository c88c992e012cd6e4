// SPDX-License-Identifier: GPL-3.0-only

//! Filter catalog
//!
//! The closed set of booth filters. Every identifier maps to an immutable
//! [`FilterParams`] record and a localized display name. The same record is
//! consumed by the live preview and by still rasterization, so what the
//! customer sees before the shutter is what ends up in the photo.

pub mod params;

pub use params::{FilterParams, FilterStep};

use crate::fl;
use tracing::debug;

/// Filter identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterId {
    /// No filter
    #[default]
    None,
    Sepia,
    Grayscale,
    Blur,
    Contrast,
    Rainbow,
    Neon,
    Vintage,
}

impl FilterId {
    /// All filters, in the order of the digit shortcuts 1-8
    pub const ALL: [FilterId; 8] = [
        FilterId::None,
        FilterId::Sepia,
        FilterId::Grayscale,
        FilterId::Blur,
        FilterId::Contrast,
        FilterId::Rainbow,
        FilterId::Neon,
        FilterId::Vintage,
    ];

    /// Stable identifier string
    pub fn name(&self) -> &'static str {
        match self {
            FilterId::None => "none",
            FilterId::Sepia => "sepia",
            FilterId::Grayscale => "grayscale",
            FilterId::Blur => "blur",
            FilterId::Contrast => "contrast",
            FilterId::Rainbow => "rainbow",
            FilterId::Neon => "neon",
            FilterId::Vintage => "vintage",
        }
    }

    /// Parse an identifier, falling back to [`FilterId::None`] for anything
    /// outside the closed set.
    pub fn from_name(name: &str) -> Self {
        match Self::ALL.iter().find(|id| id.name() == name) {
            Some(id) => *id,
            None => {
                debug!(name, "Unknown filter identifier, using none");
                FilterId::None
            }
        }
    }

    /// Filter bound to a digit shortcut (1-8)
    pub fn from_shortcut(digit: u8) -> Option<Self> {
        match digit {
            1..=8 => Some(Self::ALL[usize::from(digit - 1)]),
            _ => None,
        }
    }

    /// Digit shortcut of this filter (1-8)
    pub fn shortcut(&self) -> u8 {
        Self::ALL
            .iter()
            .position(|id| id == self)
            .map_or(1, |index| index as u8 + 1)
    }

    /// Rendering transform
    pub fn params(&self) -> FilterParams {
        match self {
            FilterId::None => FilterParams::IDENTITY,
            FilterId::Sepia => FilterParams {
                sepia: 1.0,
                contrast: 1.2,
                brightness: 1.1,
                order: &[FilterStep::Sepia, FilterStep::Contrast, FilterStep::Brightness],
                ..FilterParams::IDENTITY
            },
            FilterId::Grayscale => FilterParams {
                grayscale: 1.0,
                contrast: 1.2,
                order: &[FilterStep::Grayscale, FilterStep::Contrast],
                ..FilterParams::IDENTITY
            },
            FilterId::Blur => FilterParams {
                blur_radius: 1.0,
                brightness: 1.2,
                saturation: 1.3,
                order: &[FilterStep::Blur, FilterStep::Brightness, FilterStep::Saturate],
                ..FilterParams::IDENTITY
            },
            FilterId::Contrast => FilterParams {
                contrast: 1.8,
                saturation: 1.5,
                brightness: 1.1,
                order: &[FilterStep::Contrast, FilterStep::Saturate, FilterStep::Brightness],
                ..FilterParams::IDENTITY
            },
            FilterId::Rainbow => FilterParams {
                hue_rotate_deg: 180.0,
                saturation: 2.0,
                contrast: 1.3,
                order: &[FilterStep::HueRotate, FilterStep::Saturate, FilterStep::Contrast],
                ..FilterParams::IDENTITY
            },
            FilterId::Neon => FilterParams {
                contrast: 2.0,
                brightness: 1.5,
                saturation: 2.0,
                hue_rotate_deg: 90.0,
                order: &[
                    FilterStep::Contrast,
                    FilterStep::Brightness,
                    FilterStep::Saturate,
                    FilterStep::HueRotate,
                ],
                ..FilterParams::IDENTITY
            },
            FilterId::Vintage => FilterParams {
                sepia: 0.8,
                contrast: 1.4,
                brightness: 1.1,
                saturation: 0.8,
                order: &[
                    FilterStep::Sepia,
                    FilterStep::Contrast,
                    FilterStep::Brightness,
                    FilterStep::Saturate,
                ],
                ..FilterParams::IDENTITY
            },
        }
    }

    /// Localized display name
    pub fn display_name(&self) -> String {
        match self {
            FilterId::None => fl!("filter-none"),
            FilterId::Sepia => fl!("filter-sepia"),
            FilterId::Grayscale => fl!("filter-grayscale"),
            FilterId::Blur => fl!("filter-blur"),
            FilterId::Contrast => fl!("filter-contrast"),
            FilterId::Rainbow => fl!("filter-rainbow"),
            FilterId::Neon => fl!("filter-neon"),
            FilterId::Vintage => fl!("filter-vintage"),
        }
    }
}

impl From<&str> for FilterId {
    fn from(name: &str) -> Self {
        FilterId::from_name(name)
    }
}

impl From<String> for FilterId {
    fn from(name: String) -> Self {
        FilterId::from_name(&name)
    }
}

impl std::fmt::Display for FilterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in FilterId::ALL {
            assert_eq!(FilterId::from_name(id.name()), id);
        }
    }

    #[test]
    fn test_unknown_names_fall_back_to_none() {
        for name in ["", "NEON", "sepia ", "posterize", "filter-neon"] {
            assert_eq!(FilterId::from_name(name), FilterId::None, "{name:?}");
        }
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(FilterId::from_shortcut(1), Some(FilterId::None));
        assert_eq!(FilterId::from_shortcut(7), Some(FilterId::Neon));
        assert_eq!(FilterId::from_shortcut(8), Some(FilterId::Vintage));
        assert_eq!(FilterId::from_shortcut(0), None);
        assert_eq!(FilterId::from_shortcut(9), None);
        assert_eq!(FilterId::Rainbow.shortcut(), 6);
    }

    #[test]
    fn test_only_none_is_identity() {
        for id in FilterId::ALL {
            assert_eq!(id.params().is_identity(), id == FilterId::None, "{id}");
        }
    }

    #[test]
    fn test_neon_params() {
        let params = FilterId::Neon.params();
        assert_eq!(params.contrast, 2.0);
        assert_eq!(params.brightness, 1.5);
        assert_eq!(params.saturation, 2.0);
        assert_eq!(params.hue_rotate_deg, 90.0);
        assert_eq!(params.blur_radius, 0.0);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FilterId::None.display_name(), "Normal");
        assert_eq!(FilterId::Grayscale.display_name(), "Black & White");
        assert_eq!(FilterId::Vintage.display_name(), "Retro");
    }

    #[test]
    fn test_chains_run_in_authored_order() {
        // Expected values follow each filter's chain step by step
        let pixel = [90, 160, 220];
        let expected = [
            (FilterId::None, [90, 160, 220]),
            (FilterId::Sepia, [236, 207, 155]),
            (FilterId::Grayscale, [154, 154, 154]),
            (FilterId::Blur, [87, 196, 255]),
            (FilterId::Contrast, [9, 217, 255]),
            (FilterId::Rainbow, [255, 128, 0]),
            (FilterId::Neon, [255, 164, 255]),
            (FilterId::Vintage, [217, 212, 188]),
        ];
        for (id, rgb) in expected {
            let got = id.params().apply_rgb(pixel);
            let close = got.iter().zip(rgb).all(|(a, b)| a.abs_diff(b) <= 1);
            assert!(close, "{id}: got {got:?}, expected {rgb:?}");
        }
    }

    #[test]
    fn test_rainbow_rotates_hue_first() {
        assert_eq!(
            FilterId::Rainbow.params().order,
            [FilterStep::HueRotate, FilterStep::Saturate, FilterStep::Contrast]
        );
        let got = FilterId::Rainbow.params().apply_rgb([200, 60, 30]);
        assert!(got.iter().zip([0, 141, 219]).all(|(a, b)| a.abs_diff(b) <= 1), "{got:?}");
    }
}
