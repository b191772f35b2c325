//! Talvi - AI chat client library
//!
//! This library provides the core functionality for the Talvi chat client:
//! multi-modal prompt composition, turn orchestration with optimistic
//! placeholders, history reconstruction, authentication, and speech decoding.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Message model, prompt composer, turn orchestrator, history
//!   reconstructor, one-shot code generator
//! - `providers`: Generation/speech API abstraction and the Gemini backend
//! - `auth`: Session state machine and identity-provider client
//! - `storage`: SQLite-backed append-only message log
//! - `attachment`: Image/document attachment encoding
//! - `audio`: PCM speech payload decoding and the playback seam
//! - `theme`: Tri-state theme preference
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use talvi::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate()?;
//!
//!     // Session usage would go here
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod audio;
pub mod auth;
pub mod chat;
pub mod chat_mode;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod storage;
pub mod theme;

// Re-export commonly used types
pub use attachment::{Attachment, AttachmentKind};
pub use chat::{ChatMessage, ChatSession, MessageState, Role};
pub use chat_mode::ChatMode;
pub use config::Config;
pub use error::{Result, TalviError};
pub use theme::Theme;
