use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuncherError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid sheet dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown atlas format: {0}")]
    UnknownFormat(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for BuncherError {
    fn from(e: serde_json::Error) -> Self {
        BuncherError::Encode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BuncherError>;
