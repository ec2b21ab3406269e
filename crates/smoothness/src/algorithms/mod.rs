pub mod blur;
pub mod color;
pub mod composite;
pub mod sampling;

pub use blur::{blur, blur_pass, Axis, BlurKernel, SeparableBlur};
pub use color::{luma, rgb_to_hsl, smoothstep, Hsl, PreparedSample};
pub use composite::{composite, SampleMaskCompositor};
pub use sampling::{pixel_center_uv, sample_bilinear};
