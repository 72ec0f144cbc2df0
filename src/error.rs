//! Error types for the crate.
use crate::core_modules::color_mask::Hsv;
use crate::core_modules::frame::FrameError;
use thiserror::Error;

/// Rejected tracker configuration. Raised when the pipeline is built, never per tick.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("smoothing factor must be a finite number in [0, 1], got {0}")]
    SmoothingFactor(f64),

    #[error("invalid color range {lower:?}..={upper:?}: bounds are inverted or hue exceeds 179")]
    ColorRange { lower: Hsv, upper: Hsv },

    #[error("minimum blob area must be at least 1")]
    MinBlobArea,

    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// A frame could not be delivered. Distinct from receiving an empty or black frame.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("capture device is unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("failed to read a frame: {0}")]
    ReadFailed(String),

    #[error("frame source has no more frames")]
    Exhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
