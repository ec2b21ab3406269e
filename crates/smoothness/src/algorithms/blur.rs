use image::Rgba32FImage;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::Result,
    traits::ImageBlur,
    types::alloc_rgba,
};

/// Direction of a single 1D blur pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Normalized 1D taps: texel offset and weight
#[derive(Debug, Clone, PartialEq)]
pub struct BlurKernel {
    taps: Vec<(i64, f32)>,
}

impl BlurKernel {
    /// Build the `2 * radius + 1` taps for a radius.
    ///
    /// `spread` scales the distance between taps and `contrast` shapes the
    /// falloff of the weights; 1.0 for both gives a uniform box average.
    pub fn new(radius: u32, spread: f32, contrast: f32) -> Self {
        let r = radius as i64;
        let exponent = contrast - 1.0;
        let mut taps: Vec<(i64, f32)> = (-r..=r)
            .map(|i| {
                let offset = (i as f32 * spread).round() as i64;
                let falloff = 1.0 - i.unsigned_abs() as f32 / (radius as f32 + 1.0);
                (offset, falloff.powf(exponent))
            })
            .collect();

        let total: f32 = taps.iter().map(|(_, w)| w).sum();
        if total > 0.0 {
            for (_, weight) in &mut taps {
                *weight /= total;
            }
        }

        Self { taps }
    }

    pub fn taps(&self) -> &[(i64, f32)] {
        &self.taps
    }
}

/// Horizontal-then-vertical blur with edge clamping
#[derive(Debug, Clone)]
pub struct SeparableBlur {
    pub spread: f32,
    pub contrast: f32,
}

impl Default for SeparableBlur {
    fn default() -> Self {
        Self {
            spread: 1.0,
            contrast: 1.0,
        }
    }
}

impl ImageBlur for SeparableBlur {
    fn blur(&self, source: &Rgba32FImage, radius: u32) -> Result<Rgba32FImage> {
        if radius == 0 {
            return Ok(source.clone());
        }

        debug!(
            radius,
            width = source.width(),
            height = source.height(),
            "separable blur"
        );
        let kernel = BlurKernel::new(radius, self.spread, self.contrast);
        let intermediate = blur_pass(source, &kernel, Axis::Horizontal)?;
        blur_pass(&intermediate, &kernel, Axis::Vertical)
    }
}

/// Blur with the neutral box kernel
pub fn blur(source: &Rgba32FImage, radius: u32) -> Result<Rgba32FImage> {
    SeparableBlur::default().blur(source, radius)
}

fn clamp_coord(coord: i64, len: u32) -> usize {
    coord.clamp(0, len as i64 - 1) as usize
}

/// One 1D pass of `kernel` along `axis`, written to a new image
pub fn blur_pass(source: &Rgba32FImage, kernel: &BlurKernel, axis: Axis) -> Result<Rgba32FImage> {
    let (width, height) = source.dimensions();
    let mut output = alloc_rgba(width, height)?;
    if width == 0 || height == 0 {
        return Ok(output);
    }

    let src: &[f32] = source.as_raw();
    let row_len = width as usize * 4;
    let data: &mut [f32] = &mut output;

    data.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width as usize {
                let mut acc = [0.0f32; 4];
                for &(offset, weight) in kernel.taps() {
                    let (sx, sy) = match axis {
                        Axis::Horizontal => (clamp_coord(x as i64 + offset, width), y),
                        Axis::Vertical => (x, clamp_coord(y as i64 + offset, height)),
                    };
                    let base = (sy * width as usize + sx) * 4;
                    for (channel, value) in acc.iter_mut().enumerate() {
                        *value += src[base + channel] * weight;
                    }
                }
                row[x * 4..x * 4 + 4].copy_from_slice(&acc);
            }
        });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_image(width: u32, height: u32) -> Rgba32FImage {
        Rgba32FImage::from_fn(width, height, |x, y| {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            Rgba([fx, fy, (fx * fy).sqrt(), 1.0])
        })
    }

    fn checker_image(size: u32) -> Rgba32FImage {
        Rgba32FImage::from_fn(size, size, |x, y| {
            let v = if (x + y) % 2 == 0 { 1.0 } else { 0.0 };
            Rgba([v, v * 0.5, 1.0 - v, 1.0])
        })
    }

    #[test]
    fn test_radius_zero_is_exact_copy() {
        let image = gradient_image(7, 5);
        let blurred = blur(&image, 0).expect("Should blur");
        assert_eq!(blurred, image);
    }

    #[test]
    fn test_pass_order_commutes() {
        let image = gradient_image(13, 9);
        let kernel = BlurKernel::new(3, 1.0, 1.0);

        let hv = blur_pass(&blur_pass(&image, &kernel, Axis::Horizontal).unwrap(), &kernel, Axis::Vertical).unwrap();
        let vh = blur_pass(&blur_pass(&image, &kernel, Axis::Vertical).unwrap(), &kernel, Axis::Horizontal).unwrap();

        for (a, b) in hv.as_raw().iter().zip(vh.as_raw().iter()) {
            assert!((a - b).abs() < 1e-5, "{a} != {b}");
        }
    }

    #[test]
    fn test_flat_image_is_unchanged() {
        let image = Rgba32FImage::from_pixel(6, 6, Rgba([0.3, 0.6, 0.9, 1.0]));
        let blurred = blur(&image, 4).expect("Should blur");
        for pixel in blurred.pixels() {
            for (a, b) in pixel.0.iter().zip([0.3, 0.6, 0.9, 1.0].iter()) {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_blur_reduces_contrast() {
        let image = checker_image(8);
        let blurred = blur(&image, 2).expect("Should blur");
        let (min, max) = blurred
            .pixels()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        assert!(min > 0.2 && max < 0.8, "range was {min}..{max}");
    }

    #[test]
    fn test_kernel_weights_are_normalized() {
        for contrast in [1.0, 2.0, 0.5] {
            let kernel = BlurKernel::new(5, 1.0, contrast);
            let total: f32 = kernel.taps().iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-5);
            assert_eq!(kernel.taps().len(), 11);
        }
    }

    #[test]
    fn test_neutral_kernel_is_uniform() {
        let kernel = BlurKernel::new(2, 1.0, 1.0);
        for (_, weight) in kernel.taps() {
            assert!((weight - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_spread_scales_offsets() {
        let kernel = BlurKernel::new(2, 2.0, 1.0);
        let offsets: Vec<i64> = kernel.taps().iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![-4, -2, 0, 2, 4]);
    }

    #[test]
    fn test_empty_image() {
        let image = Rgba32FImage::new(0, 0);
        let blurred = blur(&image, 3).expect("Should blur");
        assert_eq!(blurred.dimensions(), (0, 0));
    }
}
