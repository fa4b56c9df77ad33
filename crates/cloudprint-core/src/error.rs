use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudPrintError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("Failed to encode page {page}: {message}")]
    Encode { page: u32, message: String },

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Cancelled before page {page}")]
    Cancelled { page: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CloudPrintError {
    /// The 1-based page the failure is attributed to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            CloudPrintError::Render { page, .. }
            | CloudPrintError::Encode { page, .. }
            | CloudPrintError::Cancelled { page } => Some(*page),
            _ => None,
        }
    }
}
