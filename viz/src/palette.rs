//! Color palettes for metric display.
//!
//! A continuous palette maps normalized metric positions to colors via a
//! lookup table of anchor stops with linear interpolation. Fixed neutral
//! colors mark NaN measurements and unmeasured background fibers; both are
//! deliberately outside the data palette so "invalid" and "absent" never
//! masquerade as values.

use plotters::style::RGBColor;
use qa::camera::Camera;

/// Neutral color for measured-but-invalid (NaN) values.
pub const NAN_COLOR: RGBColor = RGBColor(128, 128, 128);

/// De-emphasized fill for fibers with no measurement at all.
pub const BACKGROUND_COLOR: RGBColor = RGBColor(221, 221, 221);

/// Viridis anchor stops, dark purple through yellow. Perceptually uniform
/// and distinguishable from both neutral grays above.
const VIRIDIS_STOPS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (72, 40, 120),
    (62, 74, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (109, 205, 89),
    (253, 231, 37),
];

/// Continuous color palette over [0, 1].
#[derive(Debug, Clone)]
pub struct ContinuousPalette {
    stops: &'static [(u8, u8, u8)],
}

impl Default for ContinuousPalette {
    fn default() -> Self {
        Self::viridis()
    }
}

impl ContinuousPalette {
    pub fn viridis() -> Self {
        Self {
            stops: &VIRIDIS_STOPS,
        }
    }

    /// Color at normalized position `t`, clamped to [0, 1], linearly
    /// interpolated between the neighboring stops.
    pub fn color_at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        let rank = t * last as f64;
        let below = (rank.floor() as usize).min(last - 1);
        let frac = rank - below as f64;

        let (r0, g0, b0) = self.stops[below];
        let (r1, g1, b1) = self.stops[below + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// One color per bin center, for histograms sharing this palette.
    pub fn bin_colors(&self, num_bins: usize) -> Vec<RGBColor> {
        (0..num_bins)
            .map(|i| self.color_at((i as f64 + 0.5) / num_bins as f64))
            .collect()
    }
}

/// Camera display color as a plotters color.
pub fn camera_color(camera: Camera) -> RGBColor {
    let (r, g, b) = camera.display_color();
    RGBColor(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_stops() {
        let palette = ContinuousPalette::viridis();
        assert_eq!(palette.color_at(0.0), RGBColor(68, 1, 84));
        assert_eq!(palette.color_at(1.0), RGBColor(253, 231, 37));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let palette = ContinuousPalette::viridis();
        assert_eq!(palette.color_at(-2.0), palette.color_at(0.0));
        assert_eq!(palette.color_at(5.0), palette.color_at(1.0));
    }

    #[test]
    fn test_interpolation_is_monotone_in_green() {
        // Viridis green channel rises monotonically; a coarse scan should
        // never decrease.
        let palette = ContinuousPalette::viridis();
        let mut last = 0u8;
        for i in 0..=20 {
            let RGBColor(_, g, _) = palette.color_at(i as f64 / 20.0);
            assert!(g >= last);
            last = g;
        }
    }

    #[test]
    fn test_neutral_colors_outside_palette() {
        let palette = ContinuousPalette::viridis();
        for i in 0..=50 {
            let c = palette.color_at(i as f64 / 50.0);
            assert_ne!(c, NAN_COLOR);
            assert_ne!(c, BACKGROUND_COLOR);
        }
    }

    #[test]
    fn test_bin_colors_count() {
        assert_eq!(ContinuousPalette::viridis().bin_colors(50).len(), 50);
    }

    #[test]
    fn test_camera_colors() {
        assert_eq!(camera_color(Camera::B), RGBColor(70, 130, 180));
        assert_eq!(camera_color(Camera::R), RGBColor(178, 34, 34));
        assert_eq!(camera_color(Camera::Z), RGBColor(128, 128, 128));
    }
}
