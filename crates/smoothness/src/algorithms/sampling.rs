use image::{Rgba, Rgba32FImage};

use crate::types::{clamp_f32, ranges};

/// Bilinearly sample `image` at a texture coordinate with clamp-to-edge addressing.
///
/// UV (0,0) is the top-left corner of the first texel, (1,1) the
/// bottom-right corner of the last one. Coordinates are clamped into
/// [0,1] first; NaN reads as 0. An empty image samples as transparent black.
pub fn sample_bilinear(image: &Rgba32FImage, uv: [f32; 2]) -> Rgba<f32> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Rgba([0.0; 4]);
    }

    let px = clamp_f32(uv[0], &ranges::UNIT) * width as f32 - 0.5;
    let py = clamp_f32(uv[1], &ranges::UNIT) * height as f32 - 0.5;
    let fx = px - px.floor();
    let fy = py - py.floor();

    let clamp = |v: f32, len: u32| (v as i64).clamp(0, len as i64 - 1) as u32;
    let x0 = clamp(px.floor(), width);
    let x1 = clamp(px.floor() + 1.0, width);
    let y0 = clamp(py.floor(), height);
    let y1 = clamp(py.floor() + 1.0, height);

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    Rgba(out)
}

/// Texture coordinate of the centre of pixel (x, y)
pub fn pixel_center_uv(x: u32, y: u32, width: u32, height: u32) -> [f32; 2] {
    [
        (x as f32 + 0.5) / width.max(1) as f32,
        (y as f32 + 0.5) / height.max(1) as f32,
    ]
}
