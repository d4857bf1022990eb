//! Live symbol encoder backed by the `qrcode` crate.

use qrcode::{Color, EcLevel as QrEcLevel, QrCode};

use crate::error::QrError;
use crate::ports::symbol_encoder::{Symbol, SymbolEncoder};
use crate::style::EcLevel;

/// Encoder that delegates segmentation, error correction and masking to `qrcode`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrcodeEncoder;

impl QrcodeEncoder {
    /// Create a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn to_qrcode_level(level: EcLevel) -> QrEcLevel {
    match level {
        EcLevel::L => QrEcLevel::L,
        EcLevel::M => QrEcLevel::M,
        EcLevel::Q => QrEcLevel::Q,
        EcLevel::H => QrEcLevel::H,
    }
}

impl SymbolEncoder for QrcodeEncoder {
    fn encode(&self, text: &str, level: EcLevel) -> Result<Symbol, QrError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), to_qrcode_level(level))
            .map_err(|e| QrError::Encode(e.to_string()))?;
        let modules = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        Symbol::new(code.width(), modules)
    }
}
