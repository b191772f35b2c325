//! Configuration management for Talvi
//!
//! Configuration is loaded from a YAML file (by default
//! `~/.config/talvi/config.yaml`), with every field carrying a sensible
//! default so a missing file still yields a usable configuration.

use crate::chat_mode::ChatMode;
use crate::error::{Result, TalviError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_provider_name() -> String {
    "gemini".to_string()
}

fn default_provider_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_tts_voice() -> String {
    "Zephyr".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_auth_base_url() -> String {
    "http://localhost:9999".to_string()
}

fn default_auth_redirect_url() -> String {
    "http://localhost:3000/auth/callback".to_string()
}

fn default_mode() -> String {
    "normal".to_string()
}

fn default_history_limit() -> usize {
    25
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider backend name (currently only "gemini")
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of the generation API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Model used for text generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for speech synthesis
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Prebuilt voice name for speech synthesis
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,

    /// API key; prefer `api_key_env` to keep keys out of config files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_provider_base_url(),
            model: default_model(),
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the GoTrue-compatible auth API
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,

    /// Project API key sent with every auth request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Redirect target for the browser leg of a federated sign-in
    #[serde(default = "default_auth_redirect_url")]
    pub redirect_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            api_key: None,
            redirect_url: default_auth_redirect_url(),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Default response mode ("normal", "pro", or "deep")
    #[serde(default = "default_mode")]
    pub default_mode: String,

    /// Whether replies are spoken aloud automatically
    #[serde(default)]
    pub speak_replies: bool,

    /// Number of entries shown in the history list
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            speak_replies: false,
            history_limit: default_history_limit(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// History database path; defaults to the user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Identity provider settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Chat defaults
    #[serde(default)]
    pub chat: ChatConfig,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a file, or defaults when none exists
    ///
    /// An explicitly-passed path must exist; the default path is allowed
    /// to be absent.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional explicit path to a YAML config file
    ///
    /// # Errors
    ///
    /// Returns an error when an explicit path is missing or unparsable
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    TalviError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&contents)?
            }
            None => match Self::default_path() {
                Some(default_path) if default_path.exists() => {
                    let contents = std::fs::read_to_string(&default_path)?;
                    serde_yaml::from_str(&contents)?
                }
                _ => Self::default(),
            },
        };

        Ok(config)
    }

    /// Default config file location under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("ai", "talvi", "talvi")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.provider.name.is_empty() {
            return Err(TalviError::Config("Provider name cannot be empty".into()).into());
        }
        url::Url::parse(&self.provider.base_url)
            .map_err(|e| TalviError::Config(format!("Invalid provider base_url: {}", e)))?;
        url::Url::parse(&self.auth.base_url)
            .map_err(|e| TalviError::Config(format!("Invalid auth base_url: {}", e)))?;
        if self.provider.model.is_empty() {
            return Err(TalviError::Config("Provider model cannot be empty".into()).into());
        }
        ChatMode::parse_str(&self.chat.default_mode)
            .map_err(|e| TalviError::Config(format!("Invalid default_mode: {}", e)))?;
        if self.chat.history_limit == 0 {
            return Err(TalviError::Config("history_limit must be at least 1".into()).into());
        }
        Ok(())
    }

    /// Default response mode parsed from configuration
    pub fn default_chat_mode(&self) -> ChatMode {
        ChatMode::parse_lenient(&self.chat.default_mode)
    }
}
