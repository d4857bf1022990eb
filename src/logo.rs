//! Scoped staging of uploaded logo files.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::QrError;
use crate::generator::LogoAsset;

const STAGED_PREFIX: &str = "qrstyle-logo-";

/// An uploaded logo written to a uniquely named transient file.
///
/// The file is removed by [`StagedLogo::discard`] or, failing that, when the
/// value is dropped. Removal errors are logged and never propagated.
#[derive(Debug)]
pub struct StagedLogo {
    file: NamedTempFile,
    asset: LogoAsset,
}

impl StagedLogo {
    /// Write `bytes` to a fresh transient file in `dir` (or the system temp
    /// directory), keeping the extension of `original_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn stage(bytes: &[u8], original_name: &str, dir: Option<&Path>) -> Result<Self, QrError> {
        let suffix = extension_suffix(original_name);
        let mut builder = Builder::new();
        builder.prefix(STAGED_PREFIX).suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let asset = LogoAsset::new(file.path());
        log::debug!("Staged logo '{original_name}' at {}", file.path().display());
        Ok(Self { file, asset })
    }

    /// The staged file as a generator input.
    #[must_use]
    pub fn asset(&self) -> &LogoAsset {
        &self.asset
    }

    /// Path of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the staged file now, logging instead of failing if it is already gone.
    pub fn discard(self) {
        let path: PathBuf = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("Failed to remove staged logo {}: {e}", path.display());
        }
    }
}

/// `".png"` for `"logo.png"`, empty when the name has no extension.
fn extension_suffix(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}
