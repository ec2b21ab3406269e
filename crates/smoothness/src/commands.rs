use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use strum::{Display, IntoStaticStr, VariantNames};

use crate::types::{DiffuseSource, SampleSlot, SmoothnessParameters};

/// One user edit of the smoothness parameters
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SmoothnessCommand {
    /// Smoothness where the metallic map is fully metal
    SetMetalSmoothness {
        #[schemars(range(min = 0.0, max = 1.0))]
        value: f32,
    },

    /// Smoothness where the metallic map is fully non-metal
    SetBaseSmoothness {
        #[schemars(range(min = 0.0, max = 1.0))]
        value: f32,
    },

    /// Radius of the blur color samples are matched against
    SetBlurRadius {
        #[schemars(range(min = 0, max = 100))]
        radius: u32,
    },

    /// Radius of the blur the high-pass overlay is taken against
    SetOverlayBlurRadius {
        #[schemars(range(min = 10, max = 100))]
        radius: u32,
    },

    SetBlurOverlayStrength {
        #[schemars(range(min = -10.0, max = 10.0))]
        value: f32,
    },

    SetFinalContrast {
        #[schemars(range(min = -2.0, max = 2.0))]
        value: f32,
    },

    SetFinalBias {
        #[schemars(range(min = -0.5, max = 0.5))]
        value: f32,
    },

    /// Choose between the edited and the original diffuse
    SetDiffuseSource { source: DiffuseSource },

    SetSampleEnabled { slot: SampleSlot, enabled: bool },

    /// Hue, saturation and lightness weights of a sample's color distance
    SetSampleWeights {
        slot: SampleSlot,
        #[schemars(range(min = 0.0, max = 1.0))]
        hue: f32,
        #[schemars(range(min = 0.0, max = 1.0))]
        sat: f32,
        #[schemars(range(min = 0.0, max = 1.0))]
        lum: f32,
    },

    /// Color distances mapped to full and to no mask
    SetSampleMaskRange {
        slot: SampleSlot,
        #[schemars(range(min = 0.0, max = 1.0))]
        low: f32,
        #[schemars(range(min = 0.0, max = 1.0))]
        high: f32,
    },

    SetSampleSmoothness {
        slot: SampleSlot,
        #[schemars(range(min = 0.0, max = 1.0))]
        value: f32,
    },

    /// Show one sample's raw mask, or none
    Isolate { slot: Option<SampleSlot> },

    /// Pick a sample's reference color from the diffuse at a texture coordinate
    PickColor { slot: SampleSlot, uv: [f32; 2] },

    /// Restore every parameter to its default
    ResetSettings,
}

impl SmoothnessCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SmoothnessCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::SetMetalSmoothness { .. } => "Smoothness used where the surface is metallic",
            Self::SetBaseSmoothness { .. } => "Smoothness used where the surface is not metallic",
            Self::SetBlurRadius { .. } => "Blur radius of the image color samples are matched against",
            Self::SetOverlayBlurRadius { .. } => "Blur radius of the high-pass overlay",
            Self::SetBlurOverlayStrength { .. } => "Strength of the high-pass detail overlay (negative inverts)",
            Self::SetFinalContrast { .. } => "Contrast applied to the final smoothness",
            Self::SetFinalBias { .. } => "Bias added to the final smoothness",
            Self::SetDiffuseSource { .. } => "Use the edited or the original diffuse",
            Self::SetSampleEnabled { .. } => "Enable or disable a color sample",
            Self::SetSampleWeights { .. } => "Hue, saturation and lightness weights of a color sample",
            Self::SetSampleMaskRange { .. } => "Color distance range mapped from full to no mask",
            Self::SetSampleSmoothness { .. } => "Smoothness blended in where a color sample matches",
            Self::Isolate { .. } => "Show a single color sample's mask instead of the smoothness",
            Self::PickColor { .. } => "Pick a color sample's reference color from the diffuse",
            Self::ResetSettings => "Restore all smoothness parameters to their defaults",
        }
    }

    /// Apply the edit, clamping values into range.
    ///
    /// `PickColor` only records the coordinate here; sampling the color
    /// needs the diffuse image and is done by the controller.
    pub fn apply(&self, params: &mut SmoothnessParameters) {
        match self {
            Self::SetMetalSmoothness { value } => params.metal_smoothness = *value,
            Self::SetBaseSmoothness { value } => params.base_smoothness = *value,
            Self::SetBlurRadius { radius } => params.blur_radius = *radius,
            Self::SetOverlayBlurRadius { radius } => params.overlay_blur_radius = *radius,
            Self::SetBlurOverlayStrength { value } => params.blur_overlay_strength = *value,
            Self::SetFinalContrast { value } => params.final_contrast = *value,
            Self::SetFinalBias { value } => params.final_bias = *value,
            Self::SetDiffuseSource { source } => params.diffuse_source = *source,
            Self::SetSampleEnabled { slot, enabled } => params.set_sample_enabled(*slot, *enabled),
            Self::SetSampleWeights { slot, hue, sat, lum } => {
                let sample = params.sample_mut(*slot);
                sample.hue_weight = *hue;
                sample.sat_weight = *sat;
                sample.lum_weight = *lum;
            }
            Self::SetSampleMaskRange { slot, low, high } => {
                let sample = params.sample_mut(*slot);
                sample.mask_low = *low;
                sample.mask_high = *high;
            }
            Self::SetSampleSmoothness { slot, value } => params.sample_mut(*slot).smoothness = *value,
            Self::Isolate { slot } => params.isolate(*slot),
            Self::PickColor { slot, uv } => params.sample_mut(*slot).uv = *uv,
            Self::ResetSettings => *params = SmoothnessParameters::default(),
        }
        params.clamp();
    }
}
