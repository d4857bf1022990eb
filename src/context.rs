//! Service context shared read-only by the CLI and web adapters.

use std::path::{Path, PathBuf};

use crate::adapters::qrcode_encoder::QrcodeEncoder;
use crate::config::Config;
use crate::error::QrError;
use crate::generator::Generator;
use crate::style::StyleOptions;

/// Bundles the generator with the configured defaults.
pub struct ServiceContext {
    /// QR image generator.
    pub generator: Generator,
    /// Style applied to any option the caller leaves out.
    pub defaults: StyleOptions,
    /// Where uploaded logos are staged; the system temp dir when `None`.
    pub upload_dir: Option<PathBuf>,
}

impl ServiceContext {
    /// Create a live context backed by the `qrcode` encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured style defaults are invalid.
    pub fn live(config: &Config) -> Result<Self, QrError> {
        Ok(Self {
            generator: Generator::new(Box::new(QrcodeEncoder::new())),
            defaults: config.style_defaults()?,
            upload_dir: config.server.upload_dir.clone(),
        })
    }

    /// Override the staging directory for uploaded logos.
    #[must_use]
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    /// Staging directory, if one is configured.
    #[must_use]
    pub fn upload_dir(&self) -> Option<&Path> {
        self.upload_dir.as_deref()
    }
}
