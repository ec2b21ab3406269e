pub mod builder;

use std::sync::Arc;

use image::Rgba32FImage;
use tracing::info;
use crate::{
    error::Result,
    traits::{CompositeInputs, ImageBlur, SmoothnessCompositor},
    types::{BlurBuffers, SmoothnessMap, SmoothnessParameters},
};

/// The blur and compositing stages wired together
#[derive(Clone)]
pub struct Pipeline {
    blur: Arc<dyn ImageBlur>,
    compositor: Arc<dyn SmoothnessCompositor>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given stages
    pub fn new(blur: Arc<dyn ImageBlur>, compositor: Arc<dyn SmoothnessCompositor>) -> Self {
        Self { blur, compositor }
    }

    /// Run the mask-selection blur and the overlay blur over `diffuse`
    pub fn blur_buffers(&self, diffuse: &Rgba32FImage, params: &SmoothnessParameters) -> Result<BlurBuffers> {
        let blurred = self.blur.blur(diffuse, params.blur_radius)?;
        let overlay_blurred = self.blur.blur(diffuse, params.overlay_blur_radius)?;
        Ok(BlurBuffers {
            blurred,
            overlay_blurred,
        })
    }

    /// Composite a smoothness map from previously blurred buffers
    pub fn composite(
        &self,
        diffuse: &Rgba32FImage,
        metallic: &Rgba32FImage,
        buffers: &BlurBuffers,
        params: &SmoothnessParameters,
    ) -> Result<SmoothnessMap> {
        let inputs = CompositeInputs {
            diffuse,
            metallic,
            blurred: &buffers.blurred,
            overlay_blurred: &buffers.overlay_blurred,
        };
        self.compositor.composite(&inputs, params)
    }

    /// Blur and composite in one go
    pub fn process(
        &self,
        diffuse: &Rgba32FImage,
        metallic: &Rgba32FImage,
        params: &SmoothnessParameters,
    ) -> Result<SmoothnessMap> {
        let params = params.clamped();
        info!(
            width = diffuse.width(),
            height = diffuse.height(),
            blur_radius = params.blur_radius,
            overlay_blur_radius = params.overlay_blur_radius,
            "processing smoothness map"
        );
        let buffers = self.blur_buffers(diffuse, &params)?;
        self.composite(diffuse, metallic, &buffers, &params)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use crate::{traits::default_metallic, types::SampleSlot};

    #[test]
    fn test_process_flat_image() {
        let pipeline = Pipeline::default();
        let diffuse = Rgba32FImage::from_pixel(4, 4, Rgba([0.5, 0.5, 0.5, 1.0]));
        let params = SmoothnessParameters {
            base_smoothness: 0.5,
            blur_overlay_strength: 0.0,
            ..Default::default()
        };

        let map = pipeline
            .process(&diffuse, &default_metallic(), &params)
            .expect("Should process successfully");
        assert!(map.pixels().all(|p| (p.0[0] - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_blur_buffers_match_diffuse_size() {
        let pipeline = Pipeline::default();
        let diffuse = Rgba32FImage::from_pixel(5, 3, Rgba([0.1, 0.2, 0.3, 1.0]));
        let params = SmoothnessParameters {
            blur_radius: 2,
            ..Default::default()
        };
        let buffers = pipeline.blur_buffers(&diffuse, &params).expect("Should blur");
        assert_eq!(buffers.dimensions(), (5, 3));
        assert_eq!(buffers.overlay_blurred.dimensions(), (5, 3));
    }

    #[test]
    fn test_process_clamps_parameters() {
        let pipeline = Pipeline::default();
        let diffuse = Rgba32FImage::from_pixel(2, 2, Rgba([0.5, 0.5, 0.5, 1.0]));
        let mut params = SmoothnessParameters {
            base_smoothness: 3.0,
            final_bias: 2.0,
            ..Default::default()
        };
        params.isolate(Some(SampleSlot::First));

        let map = pipeline
            .process(&diffuse, &default_metallic(), &params)
            .expect("Should process successfully");
        assert!(map.pixels().all(|p| p.0[0] == 1.0));
    }
}
