//! Base provider trait and common types for Talvi
//!
//! This module defines the Provider trait that generation backends implement,
//! along with the role-tagged content types that make up a request and the
//! normalized response structures (generated text plus grounding citations).

use crate::error::{Result, TalviError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inline binary payload within a content part
///
/// Carries base64 data and its mime type, serialized in the camelCase
/// wire form the generation API expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Mime type of the payload (e.g. "image/png")
    pub mime_type: String,
    /// Base64-encoded bytes, no data-URL prefix
    pub data: String,
}

/// One part of a content block: text or inline binary data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text part
    Text {
        /// The text content
        text: String,
    },
    /// Inline binary part (image attachment)
    InlineData {
        /// The binary payload
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    /// Creates a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an inline-data part from a mime type and base64 payload
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Role-tagged content block in a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Role of the content author ("user" or "model")
    pub role: String,
    /// Ordered content parts
    pub parts: Vec<Part>,
}

impl Content {
    /// Creates a user content block with a single text part
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::providers::Content;
    ///
    /// let content = Content::user("Hello");
    /// assert_eq!(content.role, "user");
    /// assert_eq!(content.parts.len(), 1);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a model content block with a single text part
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a user content block from pre-built parts
    pub fn user_parts(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

/// A grounding citation attached to a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// URI of the cited page
    pub uri: String,
    /// Display title; falls back to the URI when the backend omits it
    pub title: String,
}

/// Assembled generation request
///
/// Produced by the prompt composer; providers translate this into their
/// own wire format.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Ordered conversation contents, history first, current turn last
    pub contents: Vec<Content>,
    /// System instruction selected by the chat mode
    pub system_instruction: String,
    /// Whether the search grounding tool is attached
    pub use_search: bool,
}

/// Normalized generation response
#[derive(Debug, Clone)]
pub struct Generation {
    /// Generated answer text
    pub text: String,
    /// Grounding citations, empty when the mode used no search tool
    pub sources: Vec<Source>,
}

impl Generation {
    /// Create a response with no citations
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::providers::Generation;
    ///
    /// let generation = Generation::new("Hello!");
    /// assert!(generation.sources.is_empty());
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    /// Create a response with citations
    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Provider trait for generation backends
///
/// All generation backends must implement this trait. Speech synthesis is
/// optional; the default implementation reports it as unsupported.
///
/// # Examples
///
/// ```no_run
/// use talvi::providers::{Generation, GenerationRequest, Provider};
/// use talvi::error::Result;
/// use async_trait::async_trait;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl Provider for MyProvider {
///     async fn generate(&self, _request: &GenerationRequest) -> Result<Generation> {
///         Ok(Generation::new("Response"))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generates a reply for the assembled request
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;

    /// Synthesizes speech for a piece of reply text
    ///
    /// # Returns
    ///
    /// Returns the base64-encoded PCM16 payload at 24 kHz mono
    ///
    /// # Errors
    ///
    /// Returns error if speech synthesis fails or is unsupported
    ///
    /// # Default Implementation
    ///
    /// The default implementation returns an error indicating that speech
    /// synthesis is not supported by this provider.
    async fn synthesize_speech(&self, _text: &str) -> Result<String> {
        Err(TalviError::SpeechNotSupported.into())
    }
}
