//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::QrError;
use crate::style::{check_box_size, parse_color, EcLevel, StyleOptions};

/// Styled QR code generator - render to a file or serve a live preview form.
#[derive(Parser, Debug)]
#[command(name = "qrstyle", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a QR code to a PNG file.
    Generate(GenerateArgs),
    /// Serve the interactive web form.
    Serve(ServeArgs),
}

/// Arguments for `qrstyle generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Text or URL to encode.
    #[arg(long)]
    pub data: String,

    /// Output file path (always written as PNG).
    #[arg(short, long)]
    pub output: PathBuf,

    /// Color of the dark modules (CSS name or hex).
    #[arg(long)]
    pub fill_color: Option<String>,

    /// Background color.
    #[arg(long)]
    pub back_color: Option<String>,

    /// Pixels per module.
    #[arg(long)]
    pub box_size: Option<u32>,

    /// Border width in modules.
    #[arg(long)]
    pub border: Option<u32>,

    /// Error-correction level: L (7%), M (15%), Q (25%), H (30%).
    #[arg(short, long, value_enum, ignore_case = true)]
    pub error_correction: Option<EcLevel>,

    /// Logo to place at the center (PNG with transparency works best).
    #[arg(long)]
    pub logo: Option<PathBuf>,
}

/// Arguments for `qrstyle serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, `HOST:PORT` (defaults to config, then 127.0.0.1:5000).
    #[arg(long)]
    pub addr: Option<String>,

    /// Directory for staging uploaded logos (defaults to config, then the system temp dir).
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,
}

impl GenerateArgs {
    /// Merge the flags over `defaults`, validating each supplied value.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidStyleOption`] for a bad color or a zero box size.
    pub fn style(&self, defaults: &StyleOptions) -> Result<StyleOptions, QrError> {
        Ok(StyleOptions {
            error_correction: self.error_correction.unwrap_or(defaults.error_correction),
            box_size: match self.box_size {
                Some(n) => check_box_size(n)?,
                None => defaults.box_size,
            },
            border: self.border.unwrap_or(defaults.border),
            fill_color: match self.fill_color.as_deref() {
                Some(c) => parse_color("fill_color", c)?,
                None => defaults.fill_color,
            },
            back_color: match self.back_color.as_deref() {
                Some(c) => parse_color("back_color", c)?,
                None => defaults.back_color,
            },
        })
    }
}
