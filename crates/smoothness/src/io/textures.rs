use std::path::Path;
use std::sync::Arc;

use image::Rgba32FImage;
use tracing::info;

use crate::{
    error::Result,
    traits::{ImageGenerations, ImageProvider},
};

/// In-memory set of the source images
#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    diffuse: Option<Arc<Rgba32FImage>>,
    diffuse_original: Option<Arc<Rgba32FImage>>,
    metallic: Option<Arc<Rgba32FImage>>,
    generations: ImageGenerations,
}

impl TextureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set whose only image is an unedited diffuse
    pub fn from_diffuse(diffuse: Rgba32FImage) -> Self {
        let mut textures = Self::new();
        textures.set_diffuse_original(diffuse);
        textures
    }

    /// Set the edited diffuse
    pub fn set_diffuse(&mut self, diffuse: Rgba32FImage) {
        self.diffuse = Some(Arc::new(diffuse));
        self.generations.diffuse += 1;
    }

    pub fn clear_diffuse(&mut self) {
        self.diffuse = None;
        self.generations.diffuse += 1;
    }

    pub fn set_diffuse_original(&mut self, diffuse: Rgba32FImage) {
        self.diffuse_original = Some(Arc::new(diffuse));
        self.generations.diffuse_original += 1;
    }

    /// Set the metallic map; `None` falls back to a flat non-metal map
    pub fn set_metallic(&mut self, metallic: Option<Rgba32FImage>) {
        self.metallic = metallic.map(Arc::new);
        self.generations.metallic += 1;
    }

    /// Load the original diffuse from an image file
    pub fn load_diffuse_original<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let image = load_rgba32f(path.as_ref())?;
        self.set_diffuse_original(image);
        Ok(())
    }

    /// Load the edited diffuse from an image file
    pub fn load_diffuse<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let image = load_rgba32f(path.as_ref())?;
        self.set_diffuse(image);
        Ok(())
    }

    pub fn load_metallic<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let image = load_rgba32f(path.as_ref())?;
        self.set_metallic(Some(image));
        Ok(())
    }
}

fn load_rgba32f(path: &Path) -> Result<Rgba32FImage> {
    let image = image::open(path)?.to_rgba32f();
    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded texture"
    );
    Ok(image)
}

impl ImageProvider for TextureSet {
    fn diffuse(&self) -> Option<Arc<Rgba32FImage>> {
        self.diffuse.clone()
    }

    fn diffuse_original(&self) -> Option<Arc<Rgba32FImage>> {
        self.diffuse_original.clone()
    }

    fn metallic(&self) -> Option<Arc<Rgba32FImage>> {
        self.metallic.clone()
    }

    fn generations(&self) -> ImageGenerations {
        self.generations
    }
}
