use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpritesheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid source image '{key}': {reason}")]
    InvalidSourceImage { key: String, reason: String },
    #[error(
        "Packing infeasible: atlas needs {}x{} but the configured maximum is {}x{}",
        .required.0, .required.1, .available.0, .available.1
    )]
    PackingInfeasible {
        required: (u32, u32),
        available: (u32, u32),
    },
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack")]
    Empty,
}

impl SpritesheetError {
    pub(crate) fn invalid_source(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSourceImage {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpritesheetError>;
