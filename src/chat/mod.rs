//! Conversation core
//!
//! The message data model, the prompt composer, the turn orchestrator, the
//! history reconstructor, and the one-shot code generator. Everything here
//! is UI-agnostic; the REPL in `commands::chat` is just one front end over
//! this module.

pub mod codegen;
pub mod composer;
pub mod history;
pub mod message;
pub mod session;

pub use message::{ChatMessage, MessageState, Role};
pub use session::ChatSession;
