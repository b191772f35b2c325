//! Generation provider implementations
//!
//! This module contains the provider trait, shared request/response types,
//! and the Gemini backend, plus a factory for creating providers from
//! configuration.

use crate::config::ProviderConfig;
use crate::error::{Result, TalviError};

pub mod base;
pub mod gemini;

pub use base::{
    Content, Generation, GenerationRequest, InlineData, Part, Provider, Source,
};
pub use gemini::GeminiProvider;

/// Create a provider from configuration
///
/// # Arguments
///
/// * `config` - Provider configuration naming the backend
///
/// # Errors
///
/// Returns an error for unknown provider names or missing credentials
///
/// # Examples
///
/// ```no_run
/// use talvi::config::ProviderConfig;
/// use talvi::providers::create_provider;
///
/// let config = ProviderConfig::default();
/// let provider = create_provider(&config).unwrap();
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.name.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => Err(TalviError::Config(format!("Unknown provider: {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_unknown_name() {
        let config = ProviderConfig {
            name: "delphi".to_string(),
            ..ProviderConfig::default()
        };
        let error = create_provider(&config).err().expect("must be rejected");
        assert!(error.to_string().contains("Unknown provider: delphi"));
    }

    #[test]
    fn test_create_provider_gemini() {
        let config = ProviderConfig {
            api_key: Some("key".to_string()),
            ..ProviderConfig::default()
        };
        assert!(create_provider(&config).is_ok());
    }
}
