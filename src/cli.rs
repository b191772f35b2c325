//! Command-line interface definition for Talvi
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, history browsing, and authentication.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Talvi - AI chat client
///
/// Chat with a hosted generation model in search-grounded, creative, or
/// deep-research mode, with attachments, spoken replies, and persistent
/// conversation history.
#[derive(Parser, Debug, Clone)]
#[command(name = "talvi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the history database path
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Talvi
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Response mode: normal, pro, or deep
        #[arg(short, long)]
        mode: Option<String>,

        /// Speak every reply aloud
        #[arg(long)]
        speak: bool,
    },

    /// Generate a single-file code implementation
    Code {
        /// Target language or framework
        #[arg(short, long, default_value = "react")]
        language: String,

        /// What to build
        prompt: String,
    },

    /// Browse conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Sign in to the identity provider
    Login {
        /// Email address; prompted for a password
        #[arg(short, long)]
        email: Option<String>,

        /// Create the account instead of signing in
        #[arg(long)]
        signup: bool,

        /// Start a temporary anonymous session (expires after 10 minutes)
        #[arg(long)]
        anonymous: bool,

        /// Sign in through a federated provider (e.g. github, google)
        #[arg(long, conflicts_with_all = ["email", "signup", "anonymous"])]
        provider: Option<String>,
    },

    /// Sign out and discard the cached session
    Logout,
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List recent turns
    List {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the conversation thread anchored at a message
    Show {
        /// Message id to reconstruct around
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
