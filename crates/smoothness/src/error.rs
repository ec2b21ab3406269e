use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmoothnessError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("No diffuse image loaded")]
    NoImageLoaded,

    #[error("Unable to allocate a {width}x{height} buffer")]
    Allocation { width: u32, height: u32 },

    #[error("Image dimensions {actual:?} do not match diffuse dimensions {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid color sample index: {0} (expected 1, 2 or 3)")]
    InvalidSampleSlot(u8),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,

    #[error("Processing worker panicked")]
    WorkerPanicked,

    #[error("The last processing run failed; change a parameter or image to retry")]
    RunFailed,

    #[error("Processing lock still busy after {0:?}")]
    LockTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, SmoothnessError>;
