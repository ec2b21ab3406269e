use std::sync::Arc;

use crate::{
    pipeline::Pipeline,
    traits::{ImageBlur, SmoothnessCompositor},
    algorithms::{SampleMaskCompositor, SeparableBlur},
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    blur: Option<Arc<dyn ImageBlur>>,
    compositor: Option<Arc<dyn SmoothnessCompositor>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            blur: None,
            compositor: None,
        }
    }

    /// Set the blur stage (replaces any existing one)
    pub fn set_blur<B>(mut self, blur: B) -> Self
    where
        B: ImageBlur + 'static,
    {
        self.blur = Some(Arc::new(blur));
        self
    }

    /// Set the compositing stage (replaces any existing one)
    pub fn set_compositor<C>(mut self, compositor: C) -> Self
    where
        C: SmoothnessCompositor + 'static,
    {
        self.compositor = Some(Arc::new(compositor));
        self
    }

    /// Use the separable blur with a custom tap spread and weight contrast
    pub fn with_blur_shape(self, spread: f32, contrast: f32) -> Self {
        self.set_blur(SeparableBlur { spread, contrast })
    }

    /// Build the pipeline with default stages if not specified
    pub fn build(self) -> Pipeline {
        let blur = self.blur
            .unwrap_or_else(|| Arc::new(SeparableBlur::default()));

        let compositor = self.compositor
            .unwrap_or_else(|| Arc::new(SampleMaskCompositor));

        Pipeline::new(blur, compositor)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
