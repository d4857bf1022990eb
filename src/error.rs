//! Unified error type for qrstyle.

use thiserror::Error;

/// Errors that can occur while building, rendering, or serving a QR code.
#[derive(Debug, Error)]
pub enum QrError {
    /// A style option failed validation at the input boundary.
    #[error("Invalid style option '{field}': {message}")]
    InvalidStyleOption {
        /// Name of the offending field (e.g. `box_size`).
        field: &'static str,
        /// What was wrong with the value.
        message: String,
    },

    /// The QR encoder could not fit the payload into any symbol version.
    #[error("QR encode error: {0}")]
    Encode(String),

    /// Decoding, resizing, or encoding a raster image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// A submitted form could not be parsed.
    #[error("Malformed form: {0}")]
    Form(String),

    /// The HTTP server could not bind or accept connections.
    #[error("Server error: {0}")]
    Server(String),
}

impl QrError {
    /// Build an [`QrError::InvalidStyleOption`] for `field`.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidStyleOption { field, message: message.into() }
    }

    /// Whether the error was caused by the caller's input rather than by us.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidStyleOption { .. } | Self::Form(_))
    }
}

impl From<multer::Error> for QrError {
    fn from(e: multer::Error) -> Self {
        Self::Form(e.to_string())
    }
}
