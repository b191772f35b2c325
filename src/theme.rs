//! Theme preference handling
//!
//! The theme is a tri-state preference (light, dark, or follow the OS)
//! persisted as a single key in the user's config directory. When the
//! preference is `System`, the effective appearance is re-derived from the
//! OS dark-mode hint on every resolution.

use crate::error::{Result, TalviError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Always light appearance
    Light,
    /// Always dark appearance
    Dark,
    /// Follow the operating system preference
    #[default]
    System,
}

/// Effective appearance after resolving `Theme::System`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
            Self::System => write!(f, "system"),
        }
    }
}

impl Theme {
    /// Parse a theme from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::theme::Theme;
    ///
    /// assert_eq!(Theme::parse_str("dark").unwrap(), Theme::Dark);
    /// assert!(Theme::parse_str("solarized").is_err());
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }

    /// Resolve the effective appearance
    ///
    /// `os_prefers_dark` is the platform dark-mode hint, consulted only
    /// when the preference is `System`.
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::theme::{Appearance, Theme};
    ///
    /// assert_eq!(Theme::Light.resolve(true), Appearance::Light);
    /// assert_eq!(Theme::System.resolve(true), Appearance::Dark);
    /// assert_eq!(Theme::System.resolve(false), Appearance::Light);
    /// ```
    pub fn resolve(&self, os_prefers_dark: bool) -> Appearance {
        match self {
            Self::Light => Appearance::Light,
            Self::Dark => Appearance::Dark,
            Self::System => {
                if os_prefers_dark {
                    Appearance::Dark
                } else {
                    Appearance::Light
                }
            }
        }
    }
}

/// Single-key preference store for the theme
///
/// Reads the preference at startup and writes it back on every explicit
/// change. A missing or unreadable file yields the default (`System`).
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    /// Open the theme store in the user's config directory
    ///
    /// The path can be overridden with the `TALVI_THEME_FILE` environment
    /// variable, which is useful for tests.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("TALVI_THEME_FILE") {
            return Ok(Self::new_with_path(override_path));
        }

        let proj_dirs = ProjectDirs::from("ai", "talvi", "talvi")
            .ok_or_else(|| TalviError::Config("Could not determine config directory".into()))?;
        Ok(Self::new_with_path(proj_dirs.config_dir().join("theme")))
    }

    /// Open a theme store at an explicit path
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored preference, defaulting to `System`
    pub fn load(&self) -> Theme {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Theme::parse_str(contents.trim()).unwrap_or_default(),
            Err(_) => Theme::default(),
        }
    }

    /// Persist a preference change
    pub fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, theme.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_theme_display() {
        assert_eq!(Theme::Light.to_string(), "light");
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert_eq!(Theme::System.to_string(), "system");
    }

    #[test]
    fn test_theme_parse_str_case_insensitive() {
        assert_eq!(Theme::parse_str("DARK").unwrap(), Theme::Dark);
        assert_eq!(Theme::parse_str("Light").unwrap(), Theme::Light);
    }

    #[test]
    fn test_theme_parse_str_unknown_is_plain_message() {
        let err = Theme::parse_str("solarized").unwrap_err();
        assert_eq!(err, "Unknown theme: solarized");
    }

    #[test]
    fn test_theme_default_is_system() {
        assert_eq!(Theme::default(), Theme::System);
    }

    #[test]
    fn test_resolve_explicit_themes_ignore_os_hint() {
        assert_eq!(Theme::Light.resolve(true), Appearance::Light);
        assert_eq!(Theme::Dark.resolve(false), Appearance::Dark);
    }

    #[test]
    fn test_resolve_system_follows_os_hint() {
        assert_eq!(Theme::System.resolve(true), Appearance::Dark);
        assert_eq!(Theme::System.resolve(false), Appearance::Light);
    }

    #[test]
    fn test_store_load_defaults_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = ThemeStore::new_with_path(dir.path().join("theme"));
        assert_eq!(store.load(), Theme::System);
    }

    #[test]
    fn test_store_save_and_load_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = ThemeStore::new_with_path(dir.path().join("theme"));

        store.save(Theme::Dark).expect("save failed");
        assert_eq!(store.load(), Theme::Dark);

        store.save(Theme::Light).expect("save failed");
        assert_eq!(store.load(), Theme::Light);
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("theme");
        std::env::set_var("TALVI_THEME_FILE", path.to_string_lossy().to_string());

        let store = ThemeStore::new().expect("new with env override");
        store.save(Theme::Dark).expect("save failed");
        assert_eq!(store.load(), Theme::Dark);

        std::env::remove_var("TALVI_THEME_FILE");
    }

    #[test]
    fn test_store_load_defaults_on_garbage() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("theme");
        std::fs::write(&path, "mauve").expect("write failed");

        let store = ThemeStore::new_with_path(path);
        assert_eq!(store.load(), Theme::System);
    }
}
