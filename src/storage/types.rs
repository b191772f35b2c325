//! Storage row types

use crate::chat::message::{ChatMessage, Role};
use crate::chat_mode::ChatMode;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One persisted row of the append-only message log
///
/// `sources` holds the citations as a JSON-encoded text column; the history
/// reconstructor decodes it back into structured form on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message id, identical to the in-memory id it was persisted under
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Author role
    pub role: Role,
    /// Message text
    pub text: String,
    /// Response mode active when the turn was made; display metadata only
    pub mode: ChatMode,
    /// JSON-encoded citation list, absent when there were none
    pub sources: Option<String>,
    /// Creation time, RFC-3339; ordering key of the log
    pub created_at: String,
}

impl StoredMessage {
    /// Build the row for a user turn
    pub fn user_row(user_id: impl Into<String>, message: &ChatMessage, mode: ChatMode) -> Self {
        Self {
            id: message.id.clone(),
            user_id: user_id.into(),
            role: Role::User,
            text: message.text().to_string(),
            mode,
            sources: None,
            created_at: message.created_at.clone(),
        }
    }

    /// Build the row for a resolved model turn
    ///
    /// # Errors
    ///
    /// Returns an error when the citation list cannot be JSON-encoded
    pub fn model_row(
        user_id: impl Into<String>,
        message: &ChatMessage,
        mode: ChatMode,
    ) -> Result<Self> {
        let sources = if message.sources().is_empty() {
            None
        } else {
            Some(serde_json::to_string(message.sources())?)
        };

        Ok(Self {
            id: message.id.clone(),
            user_id: user_id.into(),
            role: Role::Model,
            text: message.text().to_string(),
            mode,
            sources,
            created_at: message.created_at.clone(),
        })
    }
}

/// Read-only projection of a persisted message for the history list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Message id, usable as a reconstruction anchor
    pub id: String,
    /// Message text
    pub text: String,
    /// Author role
    pub role: Role,
    /// Response mode the turn was made in
    pub mode: ChatMode,
    /// Creation time, RFC-3339
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Source;

    #[test]
    fn test_user_row_from_message() {
        let msg = ChatMessage::user("Hello", None);
        let row = StoredMessage::user_row("u1", &msg, ChatMode::Normal);

        assert_eq!(row.id, msg.id);
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.role, Role::User);
        assert_eq!(row.text, "Hello");
        assert!(row.sources.is_none());
        assert_eq!(row.created_at, msg.created_at);
    }

    #[test]
    fn test_model_row_encodes_sources_as_json() {
        let mut msg = ChatMessage::placeholder();
        msg.resolve(
            "Answer",
            vec![Source {
                uri: "https://example.com".to_string(),
                title: "Example".to_string(),
            }],
        );

        let row = StoredMessage::model_row("u1", &msg, ChatMode::Deep).unwrap();
        assert_eq!(row.id, msg.id);
        assert_eq!(row.role, Role::Model);
        assert_eq!(row.mode, ChatMode::Deep);

        let encoded = row.sources.expect("sources present");
        let decoded: Vec<Source> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].uri, "https://example.com");
    }

    #[test]
    fn test_model_row_without_sources_stores_none() {
        let mut msg = ChatMessage::placeholder();
        msg.resolve("Answer", Vec::new());

        let row = StoredMessage::model_row("u1", &msg, ChatMode::Pro).unwrap();
        assert!(row.sources.is_none());
    }
}
