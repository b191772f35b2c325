//! Conversation message types
//!
//! A message is one turn in a conversation. A model turn starts life as a
//! `Pending` placeholder the instant its request is dispatched and is
//! resolved in place (same id) once the generation call completes, so a
//! pending message is always a representable, checkable state rather than
//! a magic empty string.

use crate::attachment::Attachment;
use crate::providers::Source;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Current UTC time as an RFC-3339 string, the ordering key of the log
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user
    User,
    /// The generation model
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

impl Role {
    /// Parse a role from its stored string form
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::chat::Role;
    ///
    /// assert_eq!(Role::parse_str("model").unwrap(), Role::Model);
    /// assert!(Role::parse_str("assistant").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s {
            "user" => Ok(Self::User),
            "model" => Ok(Self::Model),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Resolution state of a message
///
/// `Pending` exists only in memory while a generation call is in flight;
/// a persisted model row is always written from `Resolved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MessageState {
    /// Placeholder awaiting the generation result
    Pending,
    /// Final content, with citations when the mode used search grounding
    Resolved {
        /// The message text
        text: String,
        /// Grounding citations; empty for user turns and ungrounded replies
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sources: Vec<Source>,
    },
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier, stable across the pending/resolved transition
    pub id: String,
    /// Author role
    pub role: Role,
    /// Resolution state carrying the content
    pub state: MessageState,
    /// Attachment included with a user turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Creation time, RFC-3339
    pub created_at: String,
}

impl ChatMessage {
    /// Create a resolved user message
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::chat::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Hello", None);
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.text(), "Hello");
    /// ```
    pub fn user(text: impl Into<String>, attachment: Option<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            state: MessageState::Resolved {
                text: text.into(),
                sources: Vec::new(),
            },
            attachment,
            created_at: now_rfc3339(),
        }
    }

    /// Create a pending model placeholder with a fresh id
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Model,
            state: MessageState::Pending,
            attachment: None,
            created_at: now_rfc3339(),
        }
    }

    /// Create a resolved model message with an explicit id
    ///
    /// Used when rebuilding a conversation from persisted rows.
    pub fn resolved(
        id: impl Into<String>,
        role: Role,
        text: impl Into<String>,
        sources: Vec<Source>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            state: MessageState::Resolved {
                text: text.into(),
                sources,
            },
            attachment: None,
            created_at: created_at.into(),
        }
    }

    /// Whether this message is still awaiting its generation result
    pub fn is_pending(&self) -> bool {
        matches!(self.state, MessageState::Pending)
    }

    /// The message text; empty while pending
    pub fn text(&self) -> &str {
        match &self.state {
            MessageState::Pending => "",
            MessageState::Resolved { text, .. } => text,
        }
    }

    /// Grounding citations; empty while pending
    pub fn sources(&self) -> &[Source] {
        match &self.state {
            MessageState::Pending => &[],
            MessageState::Resolved { sources, .. } => sources,
        }
    }

    /// Resolve this message in place, keeping its id and position
    pub fn resolve(&mut self, text: impl Into<String>, sources: Vec<Source>) {
        self.state = MessageState::Resolved {
            text: text.into(),
            sources,
        };
    }
}
