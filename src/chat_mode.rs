//! Chat mode types and utilities
//!
//! This module defines the response modes for a conversation turn:
//! - Normal mode: search-grounded answers with citations
//! - Pro mode: creative answers without external tools
//! - Deep mode: deep-research answers with extensive search grounding
//!
//! The mode selects the system instruction sent to the generation API and
//! whether the search tool is attached to the request.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// System instruction for search-grounded answers.
const SYSTEM_INSTRUCTION_NORMAL: &str = "You are Talvi, a helpful and sophisticated AI assistant \
    specializing in generating responses grounded in real-time search results. Keep your answers \
    clear, concise, and professional. Use markdown for formatting.";

/// System instruction for creative answers without external tools.
const SYSTEM_INSTRUCTION_PRO: &str = "You are Talvi Pro, a creative and advanced AI assistant. \
    Respond thoughtfully and provide deep insights. Do NOT use external search tools. Use \
    markdown for formatting.";

/// System instruction for deep-research answers.
const SYSTEM_INSTRUCTION_DEEP: &str = "You are Talvi Deep Research, a highly advanced AI \
    assistant. Your goal is to provide deep, comprehensive, and insightful answers, using search \
    results to gather extensive information. Synthesize findings, analyze deeply, and provide \
    expert-level explanations.";

/// Response mode for a conversation turn
///
/// Determines the system instruction and tool configuration used when
/// composing a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Search-grounded mode: answers cite real-time search results
    #[default]
    Normal,

    /// Creative mode: no external tools, free-form answers
    Pro,

    /// Deep-research mode: extensive search grounding and synthesis
    Deep,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Pro => write!(f, "pro"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

impl ChatMode {
    /// Parse a chat mode from a string
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the mode ("normal", "pro", or "deep")
    ///
    /// # Returns
    ///
    /// Returns the parsed ChatMode or an error if the string is invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::chat_mode::ChatMode;
    ///
    /// let mode = ChatMode::parse_str("deep").unwrap();
    /// assert_eq!(mode, ChatMode::Deep);
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "pro" => Ok(Self::Pro),
            "deep" => Ok(Self::Deep),
            other => Err(format!("Unknown chat mode: {}", other)),
        }
    }

    /// Parse a stored mode token leniently
    ///
    /// History rows carry the mode as display-only metadata; unknown or
    /// missing tokens fall back to `Normal` instead of failing the read.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse_str(s).unwrap_or(Self::Normal)
    }

    /// Get a user-friendly description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Search-grounded answers with citations",
            Self::Pro => "Creative answers without external tools",
            Self::Deep => "Deep-research answers with extensive grounding",
        }
    }

    /// Get the system instruction sent to the generation API in this mode
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::chat_mode::ChatMode;
    ///
    /// assert!(ChatMode::Deep.system_instruction().contains("Deep Research"));
    /// ```
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::Normal => SYSTEM_INSTRUCTION_NORMAL,
            Self::Pro => SYSTEM_INSTRUCTION_PRO,
            Self::Deep => SYSTEM_INSTRUCTION_DEEP,
        }
    }

    /// Whether the search tool is attached to requests in this mode
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::chat_mode::ChatMode;
    ///
    /// assert!(ChatMode::Normal.uses_search());
    /// assert!(!ChatMode::Pro.uses_search());
    /// ```
    pub fn uses_search(&self) -> bool {
        match self {
            Self::Normal | Self::Deep => true,
            Self::Pro => false,
        }
    }

    /// Get a colored tag representation of this mode
    ///
    /// # Returns
    ///
    /// A colored string suitable for display in terminal output
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Normal => format!("[{}]", "NORMAL".cyan()),
            Self::Pro => format!("[{}]", "PRO".green()),
            Self::Deep => format!("[{}]", "DEEP".purple()),
        }
    }
}
