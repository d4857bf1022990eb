//! Style options and their validation at the input boundary.
//!
//! Both adapters funnel their raw inputs through this module, so a value
//! that reaches the generator is always well-formed.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::QrError;

/// Default error-correction level.
pub const DEFAULT_ERROR_CORRECTION: EcLevel = EcLevel::M;
/// Default pixels per module.
pub const DEFAULT_BOX_SIZE: u32 = 10;
/// Default border width, in modules.
pub const DEFAULT_BORDER: u32 = 4;
/// Default color of dark modules (`black`).
pub const DEFAULT_FILL_COLOR: Color = Color::rgb(0, 0, 0);
/// Default color of light modules and the border (`white`).
pub const DEFAULT_BACK_COLOR: Color = Color::rgb(255, 255, 255);

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum EcLevel {
    /// Recovers ~7% of damaged codewords.
    L,
    /// Recovers ~15%.
    M,
    /// Recovers ~25%.
    Q,
    /// Recovers ~30%.
    H,
}

impl FromStr for EcLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(format!("unknown level '{s}'. Valid: L, M, Q, H")),
        }
    }
}

impl EcLevel {
    /// Parse a level, falling back to [`EcLevel::M`] on anything unrecognized.
    ///
    /// `field` only labels the warning.
    #[must_use]
    pub fn parse_or_m(field: &str, value: &str) -> Self {
        value.parse().unwrap_or_else(|e| {
            log::warn!("{field}: {e}; using M");
            Self::M
        })
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(letter)
    }
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color([u8; 3]);

impl Color {
    /// Build a color from raw channel values.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Parse a CSS color (`red`, `#0af`, `#00aaff`, `rgb(0 170 255)`, ...).
    ///
    /// Any alpha component is dropped: the rendered image has no alpha channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a color the parser understands.
    pub fn parse(s: &str) -> Result<Self, String> {
        let parsed = csscolorparser::parse(s.trim()).map_err(|e| format!("'{s}': {e}"))?;
        let [r, g, b, _] = parsed.to_rgba8();
        Ok(Self([r, g, b]))
    }

    /// The color as an `image` pixel.
    #[must_use]
    pub const fn to_pixel(self) -> image::Rgb<u8> {
        image::Rgb(self.0)
    }
}

/// Validated rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    /// Error-correction level handed to the encoder.
    pub error_correction: EcLevel,
    /// Pixels per module, at least 1.
    pub box_size: u32,
    /// Padding around the symbol, in modules.
    pub border: u32,
    /// Color of dark modules.
    pub fill_color: Color,
    /// Color of light modules and the border.
    pub back_color: Color,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            error_correction: DEFAULT_ERROR_CORRECTION,
            box_size: DEFAULT_BOX_SIZE,
            border: DEFAULT_BORDER,
            fill_color: DEFAULT_FILL_COLOR,
            back_color: DEFAULT_BACK_COLOR,
        }
    }
}

/// Raw, unvalidated style fields as they arrive from a web form.
///
/// A field that is missing or blank takes the value from the defaults
/// passed to [`StyleForm::resolve`]. An unknown error-correction level
/// becomes `M`; every other field must parse.
#[derive(Debug, Clone, Default)]
pub struct StyleForm {
    /// `error_correction` field.
    pub error_correction: Option<String>,
    /// `box_size` field.
    pub box_size: Option<String>,
    /// `border` field.
    pub border: Option<String>,
    /// `fill_color` field.
    pub fill_color: Option<String>,
    /// `back_color` field.
    pub back_color: Option<String>,
}

impl StyleForm {
    /// Validate the form against `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidStyleOption`] naming the first bad field.
    pub fn resolve(&self, defaults: &StyleOptions) -> Result<StyleOptions, QrError> {
        let error_correction = match present(self.error_correction.as_deref()) {
            Some(v) => EcLevel::parse_or_m("error_correction", v),
            None => defaults.error_correction,
        };
        let box_size = match present(self.box_size.as_deref()) {
            Some(v) => parse_box_size(v)?,
            None => defaults.box_size,
        };
        let border = match present(self.border.as_deref()) {
            Some(v) => parse_border(v)?,
            None => defaults.border,
        };
        let fill_color = match present(self.fill_color.as_deref()) {
            Some(v) => parse_color("fill_color", v)?,
            None => defaults.fill_color,
        };
        let back_color = match present(self.back_color.as_deref()) {
            Some(v) => parse_color("back_color", v)?,
            None => defaults.back_color,
        };

        Ok(StyleOptions { error_correction, box_size, border, fill_color, back_color })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse and check a module size.
///
/// # Errors
///
/// Returns an error if the value is not an integer or is zero.
pub fn parse_box_size(value: &str) -> Result<u32, QrError> {
    let n: u32 = value
        .trim()
        .parse()
        .map_err(|_| QrError::invalid("box_size", format!("'{value}' is not a whole number")))?;
    check_box_size(n)
}

/// Reject a zero module size.
///
/// # Errors
///
/// Returns an error if `n` is zero.
pub fn check_box_size(n: u32) -> Result<u32, QrError> {
    if n == 0 {
        return Err(QrError::invalid("box_size", "must be at least 1"));
    }
    Ok(n)
}

/// Parse a border width.
///
/// # Errors
///
/// Returns an error if the value is not a non-negative integer.
pub fn parse_border(value: &str) -> Result<u32, QrError> {
    value
        .trim()
        .parse()
        .map_err(|_| QrError::invalid("border", format!("'{value}' is not a whole number")))
}

/// Parse a color for `field`.
///
/// # Errors
///
/// Returns an error if the color is not recognized.
pub fn parse_color(field: &'static str, value: &str) -> Result<Color, QrError> {
    Color::parse(value).map_err(|e| QrError::invalid(field, e))
}
