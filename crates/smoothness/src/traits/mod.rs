use std::sync::Arc;

use image::{Rgba, Rgba32FImage};
use crate::{
    error::Result,
    io::ProjectSettings,
    types::{DiffuseSource, SmoothnessMap, SmoothnessParameters},
};

/// Trait for blur algorithms run over a color image
pub trait ImageBlur: Send + Sync {
    /// Blur `source` with the given radius, writing into a new image
    fn blur(&self, source: &Rgba32FImage, radius: u32) -> Result<Rgba32FImage>;
}

/// Images consumed by one compositing run
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    pub diffuse: &'a Rgba32FImage,
    pub metallic: &'a Rgba32FImage,
    pub blurred: &'a Rgba32FImage,
    pub overlay_blurred: &'a Rgba32FImage,
}

/// Trait for turning blurred diffuse images into a smoothness map
pub trait SmoothnessCompositor: Send + Sync {
    /// Composite a single channel smoothness map the size of `inputs.diffuse`
    fn composite(
        &self,
        inputs: &CompositeInputs<'_>,
        params: &SmoothnessParameters,
    ) -> Result<SmoothnessMap>;
}

/// Change counters for each provided image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageGenerations {
    pub diffuse: u64,
    pub diffuse_original: u64,
    pub metallic: u64,
}

impl ImageGenerations {
    /// Counter of the diffuse that `source` selects
    pub fn diffuse_for(&self, source: DiffuseSource) -> u64 {
        match source {
            DiffuseSource::Adjusted => self.diffuse,
            DiffuseSource::Original => self.diffuse_original,
        }
    }
}

/// Source of the images the pipeline reads
pub trait ImageProvider: Send + Sync {
    /// The edited diffuse, if one exists
    fn diffuse(&self) -> Option<Arc<Rgba32FImage>>;

    /// The diffuse as originally loaded
    fn diffuse_original(&self) -> Option<Arc<Rgba32FImage>>;

    fn metallic(&self) -> Option<Arc<Rgba32FImage>>;

    /// Per-image counters, each bumped whenever that image changes
    fn generations(&self) -> ImageGenerations;

    /// The metallic map, or a flat non-metal map when none is loaded
    fn metallic_or_default(&self) -> Arc<Rgba32FImage> {
        self.metallic().unwrap_or_else(default_metallic)
    }
}

/// 1x1 fully non-metallic map
pub fn default_metallic() -> Arc<Rgba32FImage> {
    Arc::new(Rgba32FImage::from_pixel(1, 1, Rgba([0.0, 0.0, 0.0, 1.0])))
}

/// Trait for storing project settings alongside a project
pub trait SettingsStore {
    /// Load stored settings, `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<ProjectSettings>>;

    fn save(&self, settings: &ProjectSettings) -> Result<()>;
}
