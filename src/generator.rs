//! Rendering of QR symbols into styled raster images.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};

use crate::error::QrError;
use crate::ports::{Symbol, SymbolEncoder};
use crate::style::StyleOptions;

/// The logo is scaled to `1 / LOGO_SCALE_DIVISOR` of the image on each axis.
pub const LOGO_SCALE_DIVISOR: u32 = 5;

/// Largest side, in pixels, the generator will allocate.
pub const MAX_SIDE_PX: u32 = 16_384;

/// A logo image on disk to be composited over the symbol's center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoAsset {
    path: PathBuf,
}

impl LogoAsset {
    /// Refer to the logo at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the logo file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turns text plus style options into a finished RGB image.
pub struct Generator {
    encoder: Box<dyn SymbolEncoder>,
}

impl Generator {
    /// Create a generator on top of the given encoder.
    #[must_use]
    pub fn new(encoder: Box<dyn SymbolEncoder>) -> Self {
        Self { encoder }
    }

    /// Render `text` with `options`, overlaying `logo` when it names an existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be encoded, the rendered image
    /// would be too large, or the logo file exists but cannot be decoded.
    pub fn generate(
        &self,
        text: &str,
        options: &StyleOptions,
        logo: Option<&LogoAsset>,
    ) -> Result<RgbImage, QrError> {
        let symbol = self.encoder.encode(text, options.error_correction)?;
        let mut img = render(&symbol, options)?;

        match logo {
            Some(logo) if logo.path().is_file() => overlay_logo(&mut img, logo.path())?,
            Some(logo) => log::debug!("Logo {} not found, skipping overlay", logo.path().display()),
            None => {}
        }

        Ok(img)
    }
}

/// Side length in pixels of a symbol `modules` wide rendered with `options`.
///
/// # Errors
///
/// Returns an error if the side would exceed [`MAX_SIDE_PX`].
pub fn side_px(modules: usize, options: &StyleOptions) -> Result<u32, QrError> {
    u32::try_from(modules)
        .ok()
        .and_then(|m| options.border.checked_mul(2)?.checked_add(m))
        .and_then(|m| m.checked_mul(options.box_size))
        .filter(|&side| side <= MAX_SIDE_PX)
        .ok_or_else(|| {
            QrError::invalid(
                "box_size",
                format!("rendered image would exceed {MAX_SIDE_PX}px per side"),
            )
        })
}

fn render(symbol: &Symbol, options: &StyleOptions) -> Result<RgbImage, QrError> {
    let side = side_px(symbol.width(), options)?;
    let fill = options.fill_color.to_pixel();
    let back = options.back_color.to_pixel();
    let border = options.border as usize;
    let box_size = options.box_size;
    let width = symbol.width();

    Ok(RgbImage::from_fn(side, side, |px, py| {
        let mx = (px / box_size) as usize;
        let my = (py / box_size) as usize;
        let inside = (border..border + width).contains(&mx) && (border..border + width).contains(&my);
        if inside && symbol.is_dark(mx - border, my - border) {
            fill
        } else {
            back
        }
    }))
}

fn overlay_logo(img: &mut RgbImage, path: &Path) -> Result<(), QrError> {
    let logo = ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8();

    let (w, h) = img.dimensions();
    let (lw, lh) = (w / LOGO_SCALE_DIVISOR, h / LOGO_SCALE_DIVISOR);
    if lw == 0 || lh == 0 {
        return Ok(());
    }
    let logo = imageops::resize(&logo, lw, lh, FilterType::Lanczos3);

    let mut canvas = DynamicImage::ImageRgb8(std::mem::take(img)).to_rgba8();
    imageops::overlay(&mut canvas, &logo, i64::from((w - lw) / 2), i64::from((h - lh) / 2));
    *img = DynamicImage::ImageRgba8(canvas).to_rgb8();
    Ok(())
}

/// Encode an image as PNG in memory.
///
/// # Errors
///
/// Returns an error if the PNG encoder fails.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, QrError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
