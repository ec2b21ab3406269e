//! Color-space helpers used to build per-sample masks.
//!
//! A pixel is compared with a sample's reference color in HSL space. Hue
//! distance wraps around the color wheel and is scaled so opposite hues
//! are 1.0 apart; saturation and lightness distances are absolute
//! differences. The three distances are averaged using the sample's
//! weights, then remapped through `[mask_low, mask_high]` with a
//! smoothstep so pixels closer than `mask_low` are fully masked and
//! pixels further than `mask_high` are not masked at all.

use image::Rgba;

use crate::types::ColorSample;

/// Hue, saturation and lightness, each in 0..1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn from_rgba(color: Rgba<f32>) -> Self {
        let [r, g, b, _] = color.0;
        rgb_to_hsl(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
    }
}

/// RGB (0..1) → HSL (0..1)
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> Hsl {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h / 6.0
    } else if (max - g).abs() < 1e-6 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    Hsl { h, s, l }
}

/// Rec. 709 luma of the RGB channels
pub fn luma(color: Rgba<f32>) -> f32 {
    let [r, g, b, _] = color.0;
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Hermite interpolation between `edge0` and `edge1`; a hard step when the edges meet or cross
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x <= edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Weighted HSL distance in 0..1 between two colors
pub fn weighted_distance(a: Hsl, b: Hsl, hue_weight: f32, sat_weight: f32, lum_weight: f32) -> f32 {
    let total = hue_weight + sat_weight + lum_weight;
    if total <= f32::EPSILON {
        return 0.0;
    }

    let raw_hue = (a.h - b.h).abs();
    let dh = raw_hue.min(1.0 - raw_hue) * 2.0;
    let ds = (a.s - b.s).abs();
    let dl = (a.l - b.l).abs();

    ((hue_weight * dh + sat_weight * ds + lum_weight * dl) / total).clamp(0.0, 1.0)
}

/// A color sample with its reference color already converted to HSL
#[derive(Debug, Clone, Copy)]
pub struct PreparedSample {
    pub reference: Hsl,
    pub hue_weight: f32,
    pub sat_weight: f32,
    pub lum_weight: f32,
    pub mask_low: f32,
    pub mask_high: f32,
    pub smoothness: f32,
}

impl PreparedSample {
    pub fn new(sample: &ColorSample) -> Self {
        Self {
            reference: Hsl::from_rgba(sample.reference()),
            hue_weight: sample.hue_weight,
            sat_weight: sample.sat_weight,
            lum_weight: sample.lum_weight,
            mask_low: sample.mask_low,
            mask_high: sample.mask_high,
            smoothness: sample.smoothness,
        }
    }

    /// Mask weight in 0..1 for a pixel, 1.0 meaning a full match
    pub fn mask(&self, pixel: Rgba<f32>) -> f32 {
        let distance = weighted_distance(
            Hsl::from_rgba(pixel),
            self.reference,
            self.hue_weight,
            self.sat_weight,
            self.lum_weight,
        );
        1.0 - smoothstep(self.mask_low, self.mask_high, distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_rgb_to_hsl_primaries() {
        let red = rgb_to_hsl(1.0, 0.0, 0.0);
        assert!(approx(red.h, 0.0) && approx(red.s, 1.0) && approx(red.l, 0.5));

        let green = rgb_to_hsl(0.0, 1.0, 0.0);
        assert!(approx(green.h, 1.0 / 3.0));

        let gray = rgb_to_hsl(0.5, 0.5, 0.5);
        assert!(approx(gray.s, 0.0) && approx(gray.l, 0.5));
    }

    #[test]
    fn test_hue_distance_wraps() {
        let a = Hsl { h: 0.02, s: 1.0, l: 0.5 };
        let b = Hsl { h: 0.98, s: 1.0, l: 0.5 };
        assert!(approx(weighted_distance(a, b, 1.0, 0.0, 0.0), 0.08));

        let opposite = Hsl { h: 0.52, s: 1.0, l: 0.5 };
        assert!(approx(weighted_distance(a, opposite, 1.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_zero_weights_match_everything() {
        let a = rgb_to_hsl(1.0, 0.0, 0.0);
        let b = rgb_to_hsl(0.0, 0.0, 1.0);
        assert_eq!(weighted_distance(a, b, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_smoothstep_degenerate_range() {
        assert_eq!(smoothstep(0.3, 0.3, 0.3), 0.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.31), 1.0);
        assert!(approx(smoothstep(0.0, 1.0, 0.5), 0.5));
    }

    #[test]
    fn test_mask_full_match_and_miss() {
        let sample = ColorSample {
            enabled: true,
            color: [0.8, 0.2, 0.2, 1.0],
            ..Default::default()
        };
        let prepared = PreparedSample::new(&sample);

        assert!(approx(prepared.mask(Rgba([0.8, 0.2, 0.2, 1.0])), 1.0));
        assert!(approx(prepared.mask(Rgba([0.2, 0.2, 0.8, 1.0])), 0.0));
    }

    #[test]
    fn test_luma_of_white_is_one() {
        assert!(approx(luma(Rgba([1.0, 1.0, 1.0, 1.0])), 1.0));
    }
}
