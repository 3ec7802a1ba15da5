//! TOML configuration for the engine and the first window.
//!
//! ```toml
//! [runtime]
//! timeout = 30
//! default_root_folder = "ui"
//!
//! [window]
//! width = 1024
//! height = 768
//! browser = "firefox"
//! content = "index.html"
//!
//! [window.icon]
//! content = "<svg>...</svg>"
//! mime = "image/svg+xml"
//! ```
//!
//! Every key is optional; absent keys leave the engine's defaults alone.

use crate::error::{Result, WebUiError};
use crate::types::{Browser, Runtime};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub window: WindowConfig,
}

/// Process-wide engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Seconds to wait for a browser to connect; zero waits forever.
    pub timeout: Option<usize>,
    pub default_root_folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub kiosk: Option<bool>,
    pub hidden: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub root_folder: Option<String>,
    pub browser: Option<Browser>,
    pub runtime: Option<Runtime>,
    /// HTML, file name or URL to show once the window is set up.
    pub content: Option<String>,
    pub icon: Option<IconConfig>,
    pub profile: Option<ProfileConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IconConfig {
    pub content: String,
    pub mime: String,
}

/// Browser profile; empty name and path select the default profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub name: String,
    pub path: String,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| WebUiError::config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WebUiError::config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| WebUiError::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WebUiErrorCode;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            [runtime]
            timeout = 0
            default_root_folder = "ui"

            [window]
            kiosk = true
            width = 800
            height = 600
            browser = "chromium_based"
            runtime = "nodejs"
            content = "index.html"

            [window.icon]
            content = "<svg/>"
            mime = "image/svg+xml"

            [window.profile]
            name = "work"
            "#,
        )
        .unwrap();

        assert_eq!(config.runtime.timeout, Some(0));
        assert_eq!(config.runtime.default_root_folder.as_deref(), Some("ui"));
        assert_eq!(config.window.kiosk, Some(true));
        assert_eq!(config.window.width, Some(800));
        assert_eq!(config.window.browser, Some(Browser::ChromiumBased));
        assert_eq!(config.window.runtime, Some(Runtime::NodeJs));
        assert_eq!(config.window.icon.unwrap().mime, "image/svg+xml");
        let profile = config.window.profile.unwrap();
        assert_eq!(profile.name, "work");
        assert_eq!(profile.path, "");
    }

    #[test]
    fn test_browser_names() {
        let config = Config::from_toml_str("[window]\nbrowser = \"none\"").unwrap();
        assert_eq!(config.window.browser, Some(Browser::NoBrowser));
        let config = Config::from_toml_str("[window]\nbrowser = \"any\"").unwrap();
        assert_eq!(config.window.browser, Some(Browser::AnyBrowser));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_toml_str("[window]\nwidht = 3").unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::Config as u32);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runtime]\ntimeout = 12").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.runtime.timeout, Some(12));

        let err = Config::load(file.path().with_extension("missing")).unwrap_err();
        assert_eq!(err.code(), WebUiErrorCode::Config as u32);
    }

    #[test]
    fn test_toml_string_reloads() {
        let config = Config {
            window: WindowConfig {
                hidden: Some(true),
                content: Some("<html></html>".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
