//! # Smoothness From Diffuse
//!
//! Derives a single-channel PBR smoothness map from a diffuse image.
//!
//! ## Core Features
//!
//! - **Separable Blur**: horizontal-then-vertical blur, run once for color
//!   matching and once as the base of a high-pass detail overlay
//! - **Color Sample Masks**: up to three picked colors, each masking similar
//!   pixels by weighted hue/saturation/lightness distance
//! - **Two-tier Invalidation**: blurs only re-run when their inputs change;
//!   the cheap composite re-runs after every edit
//! - **Project Settings**: parameters persisted as JSON or TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smoothness::{Pipeline, SmoothnessParameters};
//! use smoothness::traits::default_metallic;
//!
//! let diffuse = image::open("diffuse.png")?.to_rgba32f();
//! let pipeline = Pipeline::builder().build();
//!
//! let map = pipeline.process(&diffuse, &default_metallic(), &SmoothnessParameters::default())?;
//! smoothness::io::save_smoothness_map(&map, "smoothness.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Interactive Use
//!
//! ```rust,no_run
//! use smoothness::{SmoothnessCommand, SmoothnessController, TextureSet};
//!
//! let mut textures = TextureSet::new();
//! textures.load_diffuse_original("diffuse.png")?;
//!
//! let mut controller = SmoothnessController::new(textures);
//! controller.apply(SmoothnessCommand::SetFinalBias { value: 0.1 })?;
//! loop {
//!     // once per frame
//!     if controller.tick()? == smoothness::PipelineState::Clean {
//!         break;
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod commands;
pub mod lock;
pub mod controller;

// Re-exports for convenience
pub use error::{SmoothnessError, Result};
pub use types::{
    BlurBuffers, ColorSample, DiffuseSource, SampleSlot, SmoothnessMap, SmoothnessParameters,
};
pub use traits::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use io::{MaterialSettings, ProjectFile, ProjectSettings, TextureSet};
pub use commands::SmoothnessCommand;
pub use lock::{ProcessingGuard, ProcessingLock};
pub use controller::{PipelineState, RunStats, SmoothnessController};
