pub mod project;
pub mod textures;

pub use project::{MaterialSettings, ProjectFile, ProjectSettings};
pub use textures::TextureSet;

use std::path::Path;

use image::{ImageBuffer, Luma};

use crate::{error::Result, types::SmoothnessMap};

/// Quantize a smoothness map to 16-bit grayscale
pub fn to_luma16(map: &SmoothnessMap) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    ImageBuffer::from_fn(map.width(), map.height(), |x, y| {
        let value = map.get_pixel(x, y).0[0].clamp(0.0, 1.0);
        Luma([(value * u16::MAX as f32).round() as u16])
    })
}

/// Save a smoothness map as a 16-bit grayscale image; format follows the extension
pub fn save_smoothness_map<P: AsRef<Path>>(map: &SmoothnessMap, path: P) -> Result<()> {
    to_luma16(map).save(path)?;
    Ok(())
}
