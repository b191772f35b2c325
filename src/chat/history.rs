//! Conversation thread reconstruction
//!
//! The persisted log is flat and time-ordered; history entries are indexed
//! by user turns only. Selecting one must yield a complete, renderable
//! thread that ends on the reply to that turn, so reconstruction expands
//! the anchor forward to the first model message that follows it and
//! returns the whole conversation prefix up to that point.

use crate::chat::message::ChatMessage;
use crate::error::{Result, TalviError};
use crate::providers::Source;
use crate::storage::StoredMessage;

/// Decode the stored JSON citation column
///
/// A corrupt column degrades to no citations instead of failing the load.
fn decode_sources(row: &StoredMessage) -> Vec<Source> {
    match &row.sources {
        Some(encoded) => serde_json::from_str(encoded).unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable sources for message {}: {}", row.id, e);
            Vec::new()
        }),
        None => Vec::new(),
    }
}

/// Reconstruct the conversation slice anchored at a selected message
///
/// # Arguments
///
/// * `log` - The user's complete persisted log, ordered ascending by
///   creation time
/// * `anchor_id` - Id of the selected message
///
/// # Returns
///
/// The inclusive prefix `log[0..=j]`, where `j` is the first model message
/// at or after the anchor's successor, or the last log index when no model
/// reply follows (an unanswered turn ends the slice on the anchor itself).
///
/// # Errors
///
/// Returns `TalviError::MessageNotFound` when no message has the anchor id
///
/// # Examples
///
/// ```no_run
/// use talvi::chat::history::reconstruct;
///
/// # let log = Vec::new();
/// let thread = reconstruct(&log, "anchor-id").unwrap();
/// ```
pub fn reconstruct(log: &[StoredMessage], anchor_id: &str) -> Result<Vec<ChatMessage>> {
    let anchor = log
        .iter()
        .position(|row| row.id == anchor_id)
        .ok_or_else(|| TalviError::MessageNotFound(anchor_id.to_string()))?;

    let end = log[anchor + 1..]
        .iter()
        .position(|row| row.role == crate::chat::message::Role::Model)
        .map(|offset| anchor + 1 + offset)
        .unwrap_or(log.len() - 1);

    Ok(log[..=end]
        .iter()
        .map(|row| {
            ChatMessage::resolved(
                row.id.clone(),
                row.role,
                row.text.clone(),
                decode_sources(row),
                row.created_at.clone(),
            )
        })
        .collect())
}
