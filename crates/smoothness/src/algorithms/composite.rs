use image::Rgba;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    algorithms::{
        color::{luma, PreparedSample},
        sampling::{pixel_center_uv, sample_bilinear},
    },
    error::{Result, SmoothnessError},
    traits::{CompositeInputs, SmoothnessCompositor},
    types::{alloc_luma, clamp_f32, ranges, SampleSlot, SmoothnessMap, SmoothnessParameters},
};

/// Compositor that blends color-sample masks over a metallic-driven baseline
#[derive(Debug, Clone, Default)]
pub struct SampleMaskCompositor;

impl SmoothnessCompositor for SampleMaskCompositor {
    fn composite(
        &self,
        inputs: &CompositeInputs<'_>,
        params: &SmoothnessParameters,
    ) -> Result<SmoothnessMap> {
        composite(inputs, params)
    }
}

fn ensure_same_size(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(SmoothnessError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Composite a smoothness map from the diffuse, its blurs and the metallic map
pub fn composite(inputs: &CompositeInputs<'_>, params: &SmoothnessParameters) -> Result<SmoothnessMap> {
    let (width, height) = inputs.diffuse.dimensions();
    ensure_same_size((width, height), inputs.blurred.dimensions())?;
    ensure_same_size((width, height), inputs.overlay_blurred.dimensions())?;

    let samples: Vec<(SampleSlot, PreparedSample)> = SampleSlot::ALL
        .iter()
        .filter(|slot| params.sample(**slot).enabled)
        .map(|slot| (*slot, PreparedSample::new(params.sample(*slot))))
        .collect();
    let isolated = params.effective_isolation();

    debug!(
        width,
        height,
        enabled_samples = samples.len(),
        ?isolated,
        "compositing smoothness"
    );

    let mut output = alloc_luma(width, height)?;
    if width == 0 || height == 0 {
        return Ok(output);
    }

    let data: &mut [f32] = &mut output;
    data.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, value) in row.iter_mut().enumerate() {
                let x = x as u32;
                let metallic = sample_bilinear(inputs.metallic, pixel_center_uv(x, y, width, height));
                *value = composite_pixel(
                    *inputs.diffuse.get_pixel(x, y),
                    *inputs.blurred.get_pixel(x, y),
                    *inputs.overlay_blurred.get_pixel(x, y),
                    metallic.0[0],
                    &samples,
                    isolated,
                    params,
                );
            }
        });

    Ok(output)
}

fn composite_pixel(
    diffuse: Rgba<f32>,
    blurred: Rgba<f32>,
    overlay_blurred: Rgba<f32>,
    metallic: f32,
    samples: &[(SampleSlot, PreparedSample)],
    isolated: Option<SampleSlot>,
    params: &SmoothnessParameters,
) -> f32 {
    let metallic = metallic.clamp(0.0, 1.0);
    let mut out = params.base_smoothness + (params.metal_smoothness - params.base_smoothness) * metallic;

    for (slot, sample) in samples {
        let mask = sample.mask(blurred);
        if isolated == Some(*slot) {
            return clamp_f32(mask, &ranges::UNIT);
        }
        out += (sample.smoothness - out) * mask;
    }

    out += (luma(diffuse) - luma(overlay_blurred)) * params.blur_overlay_strength;

    // NaN from non-finite pixels reads as 0
    clamp_f32((out - 0.5) * params.final_contrast + 0.5 + params.final_bias, &ranges::UNIT)
}
