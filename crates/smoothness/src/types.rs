use std::ops::RangeInclusive;

use image::{ImageBuffer, Luma, Rgba, Rgba32FImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Result, SmoothnessError};

/// Single channel float image holding the derived smoothness values
pub type SmoothnessMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Valid parameter ranges, as exposed by the editing controls
pub mod ranges {
    use std::ops::RangeInclusive;

    pub const BLUR_RADIUS: RangeInclusive<u32> = 0..=100;
    pub const OVERLAY_BLUR_RADIUS: RangeInclusive<u32> = 10..=100;
    pub const UNIT: RangeInclusive<f32> = 0.0..=1.0;
    pub const BLUR_OVERLAY_STRENGTH: RangeInclusive<f32> = -10.0..=10.0;
    pub const FINAL_CONTRAST: RangeInclusive<f32> = -2.0..=2.0;
    pub const FINAL_BIAS: RangeInclusive<f32> = -0.5..=0.5;
}

pub(crate) fn clamp_f32(value: f32, range: &RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

pub(crate) fn clamp_u32(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// Allocate a zeroed float buffer without aborting the process when memory runs out
pub(crate) fn try_alloc(width: u32, height: u32, channels: usize) -> Result<Vec<f32>> {
    let err = || SmoothnessError::Allocation { width, height };
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(err)?;

    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| err())?;
    data.resize(len, 0.0);
    Ok(data)
}

pub(crate) fn alloc_rgba(width: u32, height: u32) -> Result<Rgba32FImage> {
    let data = try_alloc(width, height, 4)?;
    ImageBuffer::from_raw(width, height, data).ok_or(SmoothnessError::Allocation { width, height })
}

pub(crate) fn alloc_luma(width: u32, height: u32) -> Result<SmoothnessMap> {
    let data = try_alloc(width, height, 1)?;
    ImageBuffer::from_raw(width, height, data).ok_or(SmoothnessError::Allocation { width, height })
}

/// One of the three fixed color sample slots
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SampleSlot {
    First,
    Second,
    Third,
}

impl SampleSlot {
    pub const ALL: [SampleSlot; 3] = [SampleSlot::First, SampleSlot::Second, SampleSlot::Third];

    /// Zero based position in the sample array
    pub fn index(self) -> usize {
        match self {
            SampleSlot::First => 0,
            SampleSlot::Second => 1,
            SampleSlot::Third => 2,
        }
    }
}

/// Slots are numbered 1..=3 in user-facing surfaces
impl TryFrom<u8> for SampleSlot {
    type Error = SmoothnessError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(SampleSlot::First),
            2 => Ok(SampleSlot::Second),
            3 => Ok(SampleSlot::Third),
            other => Err(SmoothnessError::InvalidSampleSlot(other)),
        }
    }
}

/// Which diffuse image feeds the pipeline
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiffuseSource {
    /// The user-edited diffuse
    #[default]
    Adjusted,
    /// The diffuse as originally loaded
    Original,
}

/// A user-picked reference color and how strongly it masks similar pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColorSample {
    pub enabled: bool,
    /// Where the color was picked, in texture space
    pub uv: [f32; 2],
    /// RGBA reference color
    pub color: [f32; 4],
    pub hue_weight: f32,
    pub sat_weight: f32,
    pub lum_weight: f32,
    pub mask_low: f32,
    pub mask_high: f32,
    /// Smoothness blended into pixels covered by this sample's mask
    pub smoothness: f32,
}

impl Default for ColorSample {
    fn default() -> Self {
        Self {
            enabled: false,
            uv: [0.0, 0.0],
            color: [0.0, 0.0, 0.0, 1.0],
            hue_weight: 1.0,
            sat_weight: 0.5,
            lum_weight: 0.2,
            mask_low: 0.0,
            mask_high: 0.1,
            smoothness: 0.5,
        }
    }
}

impl ColorSample {
    pub fn reference(&self) -> Rgba<f32> {
        Rgba(self.color)
    }

    fn clamp(&mut self) {
        self.hue_weight = clamp_f32(self.hue_weight, &ranges::UNIT);
        self.sat_weight = clamp_f32(self.sat_weight, &ranges::UNIT);
        self.lum_weight = clamp_f32(self.lum_weight, &ranges::UNIT);
        self.mask_low = clamp_f32(self.mask_low, &ranges::UNIT);
        self.mask_high = clamp_f32(self.mask_high, &ranges::UNIT);
        self.smoothness = clamp_f32(self.smoothness, &ranges::UNIT);
        for value in self.uv.iter_mut().chain(self.color.iter_mut()) {
            *value = clamp_f32(*value, &ranges::UNIT);
        }
    }
}

/// Everything the blur and compositing stages need from the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SmoothnessParameters {
    pub metal_smoothness: f32,
    pub base_smoothness: f32,
    /// Radius of the mask-selection blur
    pub blur_radius: u32,
    /// Radius of the blur the high-pass overlay is taken against
    pub overlay_blur_radius: u32,
    pub blur_overlay_strength: f32,
    pub final_contrast: f32,
    pub final_bias: f32,
    pub diffuse_source: DiffuseSource,
    pub samples: [ColorSample; 3],
    /// At most one sample shows its raw mask instead of being blended
    pub isolated: Option<SampleSlot>,
}

impl Default for SmoothnessParameters {
    fn default() -> Self {
        Self {
            metal_smoothness: 0.7,
            base_smoothness: 0.0,
            blur_radius: 0,
            overlay_blur_radius: 30,
            blur_overlay_strength: 3.0,
            final_contrast: 1.0,
            final_bias: 0.0,
            diffuse_source: DiffuseSource::Adjusted,
            samples: Default::default(),
            isolated: None,
        }
    }
}

impl SmoothnessParameters {
    pub fn sample(&self, slot: SampleSlot) -> &ColorSample {
        &self.samples[slot.index()]
    }

    pub fn sample_mut(&mut self, slot: SampleSlot) -> &mut ColorSample {
        &mut self.samples[slot.index()]
    }

    /// Isolate one sample's mask, replacing any previous isolation
    pub fn isolate(&mut self, slot: Option<SampleSlot>) {
        self.isolated = slot;
    }

    /// Enable or disable a sample; disabling the isolated sample drops the isolation
    pub fn set_sample_enabled(&mut self, slot: SampleSlot, enabled: bool) {
        self.sample_mut(slot).enabled = enabled;
        if !enabled && self.isolated == Some(slot) {
            self.isolated = None;
        }
    }

    /// The isolated slot, if that sample is also enabled
    pub fn effective_isolation(&self) -> Option<SampleSlot> {
        self.isolated.filter(|slot| self.sample(*slot).enabled)
    }

    pub fn use_adjusted_diffuse(&self) -> bool {
        self.diffuse_source == DiffuseSource::Adjusted
    }

    /// Bring every field into its documented range
    pub fn clamp(&mut self) {
        self.metal_smoothness = clamp_f32(self.metal_smoothness, &ranges::UNIT);
        self.base_smoothness = clamp_f32(self.base_smoothness, &ranges::UNIT);
        self.blur_radius = clamp_u32(self.blur_radius, &ranges::BLUR_RADIUS);
        self.overlay_blur_radius = clamp_u32(self.overlay_blur_radius, &ranges::OVERLAY_BLUR_RADIUS);
        self.blur_overlay_strength = clamp_f32(self.blur_overlay_strength, &ranges::BLUR_OVERLAY_STRENGTH);
        self.final_contrast = clamp_f32(self.final_contrast, &ranges::FINAL_CONTRAST);
        self.final_bias = clamp_f32(self.final_bias, &ranges::FINAL_BIAS);
        for sample in &mut self.samples {
            sample.clamp();
        }
        if self.effective_isolation().is_none() {
            self.isolated = None;
        }
    }

    /// Copy with every field clamped
    pub fn clamped(&self) -> Self {
        let mut params = self.clone();
        params.clamp();
        params
    }
}

/// Low-pass and overlay blurs of the current diffuse
#[derive(Debug, Clone)]
pub struct BlurBuffers {
    pub blurred: Rgba32FImage,
    pub overlay_blurred: Rgba32FImage,
}

impl BlurBuffers {
    pub fn dimensions(&self) -> (u32, u32) {
        self.blurred.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_is_exclusive() {
        let mut params = SmoothnessParameters::default();
        params.set_sample_enabled(SampleSlot::First, true);
        params.set_sample_enabled(SampleSlot::Second, true);

        params.isolate(Some(SampleSlot::First));
        params.isolate(Some(SampleSlot::Second));

        assert_eq!(params.isolated, Some(SampleSlot::Second));
        assert_eq!(params.effective_isolation(), Some(SampleSlot::Second));
    }

    #[test]
    fn test_disabling_isolated_sample_clears_isolation() {
        let mut params = SmoothnessParameters::default();
        params.set_sample_enabled(SampleSlot::Third, true);
        params.isolate(Some(SampleSlot::Third));

        params.set_sample_enabled(SampleSlot::Third, false);
        assert_eq!(params.isolated, None);
    }

    #[test]
    fn test_isolation_of_disabled_sample_has_no_effect() {
        let mut params = SmoothnessParameters::default();
        params.isolate(Some(SampleSlot::First));
        assert_eq!(params.effective_isolation(), None);
    }

    #[test]
    fn test_clamp_brings_values_into_range() {
        let mut params = SmoothnessParameters {
            metal_smoothness: 4.0,
            blur_radius: 500,
            overlay_blur_radius: 2,
            blur_overlay_strength: -50.0,
            final_contrast: f32::NAN,
            final_bias: 0.9,
            ..Default::default()
        };
        params.sample_mut(SampleSlot::Second).mask_high = 1.5;
        params.clamp();

        assert_eq!(params.metal_smoothness, 1.0);
        assert_eq!(params.blur_radius, 100);
        assert_eq!(params.overlay_blur_radius, 10);
        assert_eq!(params.blur_overlay_strength, -10.0);
        assert_eq!(params.final_contrast, -2.0);
        assert_eq!(params.final_bias, 0.5);
        assert_eq!(params.sample(SampleSlot::Second).mask_high, 1.0);
    }

    #[test]
    fn test_clamp_replaces_non_finite_sample_color() {
        let mut params = SmoothnessParameters::default();
        let sample = params.sample_mut(SampleSlot::First);
        sample.uv = [f32::INFINITY, f32::NAN];
        sample.color = [f32::NAN, 2.0, -1.0, f32::NEG_INFINITY];
        params.clamp();

        let sample = params.sample(SampleSlot::First);
        assert_eq!(sample.uv, [1.0, 0.0]);
        assert_eq!(sample.color, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sample_slot_from_index() {
        assert_eq!(SampleSlot::try_from(2).ok(), Some(SampleSlot::Second));
        assert!(matches!(
            SampleSlot::try_from(4),
            Err(SmoothnessError::InvalidSampleSlot(4))
        ));
    }

    #[test]
    fn test_parameters_restore_missing_fields() {
        let params: SmoothnessParameters =
            serde_json::from_str(r#"{ "final_bias": 0.25 }"#).expect("Should parse");
        assert_eq!(params.final_bias, 0.25);
        assert_eq!(params.overlay_blur_radius, 30);
    }

    #[test]
    fn test_try_alloc_rejects_overflow() {
        assert!(matches!(
            try_alloc(u32::MAX, u32::MAX, usize::MAX),
            Err(SmoothnessError::Allocation { .. })
        ));
    }
}
