//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::QrError;
use crate::style::{check_box_size, parse_color, EcLevel, StyleOptions};

/// Address the web form listens on when nothing else is configured.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Default style values (used when a flag or form field is absent).
    #[serde(default)]
    pub style: StyleConfig,

    /// Web server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[style]` table. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct StyleConfig {
    /// Default error-correction level (`L`, `M`, `Q`, `H`).
    pub error_correction: Option<String>,
    /// Default pixels per module.
    pub box_size: Option<u32>,
    /// Default border width in modules.
    pub border: Option<u32>,
    /// Default dark-module color.
    pub fill_color: Option<String>,
    /// Default background color.
    pub back_color: Option<String>,
}

/// `[server]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Listen address, `HOST:PORT`.
    pub addr: Option<String>,
    /// Directory for staged logo uploads (system temp dir if unset).
    pub upload_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the listen address, preferring environment variable.
    #[must_use]
    pub fn server_addr(&self) -> String {
        std::env::var("QRSTYLE_ADDR")
            .ok()
            .or_else(|| self.server.addr.clone())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
    }

    /// Validate the `[style]` table into the default style options.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidStyleOption`] for any bad configured value.
    pub fn style_defaults(&self) -> Result<StyleOptions, QrError> {
        let builtin = StyleOptions::default();
        let style = &self.style;

        let error_correction = match style.error_correction.as_deref() {
            Some(v) => EcLevel::parse_or_m("style.error_correction", v),
            None => builtin.error_correction,
        };
        let fill_color = match style.fill_color.as_deref() {
            Some(v) => parse_color("fill_color", v)?,
            None => builtin.fill_color,
        };
        let back_color = match style.back_color.as_deref() {
            Some(v) => parse_color("back_color", v)?,
            None => builtin.back_color,
        };

        Ok(StyleOptions {
            error_correction,
            box_size: check_box_size(style.box_size.unwrap_or(builtin.box_size))?,
            border: style.border.unwrap_or(builtin.border),
            fill_color,
            back_color,
        })
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `QRSTYLE_CONFIG` environment variable
/// 3. `~/.config/qrstyle/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    if let Ok(p) = std::env::var("QRSTYLE_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/qrstyle/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/qrstyle/config.toml")
    } else {
        PathBuf::from("qrstyle.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.server.addr.is_none());
        assert!(config.server.upload_dir.is_none());
        assert_eq!(config.style_defaults().unwrap(), StyleOptions::default());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.style.box_size.is_none());
    }

    #[test]
    fn load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r##"
[style]
error_correction = "h"
box_size = 6
border = 2
fill_color = "#1e3a8a"
back_color = "ivory"

[server]
addr = "0.0.0.0:8080"
upload_dir = "/var/tmp/qrstyle"
"##,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.addr.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.server.upload_dir, Some(PathBuf::from("/var/tmp/qrstyle")));

        let style = config.style_defaults().unwrap();
        assert_eq!(style.error_correction, EcLevel::H);
        assert_eq!(style.box_size, 6);
        assert_eq!(style.border, 2);
        assert_eq!(style.fill_color, Color::rgb(0x1e, 0x3a, 0x8a));
        assert_eq!(style.back_color, Color::rgb(255, 255, 240));
    }

    #[test]
    fn load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn bad_style_values_are_rejected() {
        let config = Config {
            style: StyleConfig { box_size: Some(0), ..StyleConfig::default() },
            ..Config::default()
        };
        assert!(config.style_defaults().is_err());

        let config = Config {
            style: StyleConfig { fill_color: Some("nope".into()), ..StyleConfig::default() },
            ..Config::default()
        };
        assert!(config.style_defaults().is_err());
    }

    #[test]
    fn unknown_level_in_file_falls_back_to_m() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[style]\nerror_correction = \"best\"\n").unwrap();

        let style = Config::load(&path).unwrap().style_defaults().unwrap();
        assert_eq!(style.error_correction, EcLevel::M);
    }

    #[test]
    fn server_addr_falls_back_to_file_then_default() {
        std::env::remove_var("QRSTYLE_ADDR");
        assert_eq!(Config::default().server_addr(), DEFAULT_ADDR);

        let config = Config {
            server: ServerConfig { addr: Some("0.0.0.0:9000".into()), upload_dir: None },
            ..Config::default()
        };
        assert_eq!(config.server_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some(Path::new("/tmp/my-config.toml")));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
