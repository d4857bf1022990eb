//! Symbol encoder port for turning text into a QR module matrix.

use crate::error::QrError;
use crate::style::EcLevel;

/// A square QR module matrix, without any quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    width: usize,
    modules: Vec<bool>,
}

impl Symbol {
    /// Build a symbol from row-major module colors (`true` = dark).
    ///
    /// # Errors
    ///
    /// Returns an error if `modules` is not `width * width` long.
    pub fn new(width: usize, modules: Vec<bool>) -> Result<Self, QrError> {
        if width == 0 || modules.len() != width * width {
            return Err(QrError::Encode(format!(
                "symbol of width {width} cannot hold {} modules",
                modules.len()
            )));
        }
        Ok(Self { width, modules })
    }

    /// Modules per side.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark.
    #[must_use]
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }
}

/// Encodes text into a QR symbol at the smallest version that fits.
pub trait SymbolEncoder: Send + Sync {
    /// Encode `text` at the given error-correction level.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::Encode`] if the text does not fit any version.
    fn encode(&self, text: &str, level: EcLevel) -> Result<Symbol, QrError>;
}
