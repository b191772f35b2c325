//! Prompt composition
//!
//! Builds the ordered role-tagged content list sent to the generation API
//! from the conversation history, the latest prompt, the response mode, and
//! an optional attachment. Composition is pure: no I/O, deterministic for a
//! given set of inputs.
//!
//! History replays text only. Attachments and citations from prior turns are
//! never re-sent; only the current turn's attachment goes on the wire.

use crate::attachment::{Attachment, AttachmentKind};
use crate::chat::message::ChatMessage;
use crate::chat_mode::ChatMode;
use crate::error::{Result, TalviError};
use crate::providers::{Content, GenerationRequest, Part};

/// Rewrite a prompt around an attached document
///
/// The template replaces the plain prompt text entirely; the original
/// question appears only in the QUESTION section.
fn document_prompt(file_name: &str, content: &str, prompt: &str) -> String {
    format!(
        "Based on the following document content, please answer my question.\n\n---\nDOCUMENT: {}\n---\n{}\n\n---\nQUESTION:\n---\n{}",
        file_name, content, prompt
    )
}

/// Compose a generation request for the current turn
///
/// # Arguments
///
/// * `history` - Prior conversation turns, oldest first; the current turn
///   must not already be appended
/// * `latest_prompt` - The user's new utterance
/// * `mode` - Response mode selecting instruction and tooling
/// * `attachment` - Optional attachment for this turn only
///
/// # Errors
///
/// Returns `TalviError::EmptyInput` when the prompt is blank or
/// whitespace-only and no attachment is present
///
/// # Examples
///
/// ```
/// use talvi::chat::composer::compose;
/// use talvi::chat_mode::ChatMode;
///
/// let request = compose(&[], "Hello", ChatMode::Normal, None).unwrap();
/// assert_eq!(request.contents.len(), 1);
/// assert!(request.use_search);
/// ```
pub fn compose(
    history: &[ChatMessage],
    latest_prompt: &str,
    mode: ChatMode,
    attachment: Option<&Attachment>,
) -> Result<GenerationRequest> {
    if latest_prompt.trim().is_empty() && attachment.is_none() {
        return Err(TalviError::EmptyInput.into());
    }

    let mut contents: Vec<Content> = history
        .iter()
        .map(|msg| Content {
            role: msg.role.to_string(),
            parts: vec![Part::text(msg.text())],
        })
        .collect();

    let mut parts = Vec::new();
    let mut prompt_text = latest_prompt.to_string();

    if let Some(att) = attachment {
        match att.kind {
            AttachmentKind::Image => {
                let mime_type = att.mime_type.as_deref().ok_or_else(|| {
                    TalviError::Attachment(format!(
                        "Image attachment {} has no mime type",
                        att.file_name
                    ))
                })?;
                parts.push(Part::inline_data(mime_type, att.data.clone()));
            }
            AttachmentKind::Text => {
                prompt_text = document_prompt(&att.file_name, &att.data, latest_prompt);
            }
        }
    }

    parts.push(Part::text(prompt_text));
    contents.push(Content::user_parts(parts));

    Ok(GenerationRequest {
        contents,
        system_instruction: mode.system_instruction().to_string(),
        use_search: mode.uses_search(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;
    use crate::providers::Source;

    fn history_pair() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("What is Rust?", None),
            ChatMessage::resolved(
                "m1",
                Role::Model,
                "A systems language.",
                vec![Source {
                    uri: "https://rust-lang.org".to_string(),
                    title: "Rust".to_string(),
                }],
                "2026-01-01T00:00:01+00:00",
            ),
        ]
    }

    #[test]
    fn test_compose_blank_prompt_without_attachment_is_rejected() {
        assert!(compose(&[], "", ChatMode::Normal, None).is_err());
        assert!(compose(&[], "   \t\n", ChatMode::Normal, None).is_err());
    }

    #[test]
    fn test_compose_blank_prompt_with_attachment_is_accepted() {
        let att = Attachment::image("pic.png", "image/png", &[1, 2, 3]);
        let request = compose(&[], "", ChatMode::Normal, Some(&att)).unwrap();
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].parts.len(), 2);
    }

    #[test]
    fn test_compose_replays_history_text_only() {
        let history = history_pair();
        let request = compose(&history, "Tell me more", ChatMode::Normal, None).unwrap();

        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
        assert_eq!(request.contents[2].role, "user");

        // History turns carry exactly one text part, never citations or
        // attachments.
        for content in &request.contents[..2] {
            assert_eq!(content.parts.len(), 1);
            assert!(matches!(content.parts[0], Part::Text { .. }));
        }
    }

    #[test]
    fn test_compose_image_attachment_prepends_inline_part() {
        let att = Attachment::image("pic.png", "image/png", &[1, 2, 3]);
        let request = compose(&[], "what is this?", ChatMode::Normal, Some(&att)).unwrap();

        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], Part::InlineData { .. }));
        assert!(matches!(&parts[1], Part::Text { text } if text == "what is this?"));
    }

    #[test]
    fn test_compose_text_attachment_rewrites_prompt() {
        let att = Attachment::text("report.txt", "Quarterly revenue was flat.");
        let request = compose(&[], "Summarize the report", ChatMode::Normal, Some(&att)).unwrap();

        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 1);
        let Part::Text { text } = &parts[0] else {
            panic!("expected text part");
        };
        assert!(text.contains("DOCUMENT: report.txt"));
        assert!(text.contains("QUESTION:"));
        assert!(text.contains("Quarterly revenue was flat."));
        assert!(text.contains("Summarize the report"));
        assert_ne!(text, "Summarize the report");
    }

    #[test]
    fn test_compose_mode_selects_instruction_and_tools() {
        let normal = compose(&[], "hi", ChatMode::Normal, None).unwrap();
        assert!(normal.use_search);
        assert_eq!(
            normal.system_instruction,
            ChatMode::Normal.system_instruction()
        );

        let deep = compose(&[], "hi", ChatMode::Deep, None).unwrap();
        assert!(deep.use_search);
        assert_eq!(deep.system_instruction, ChatMode::Deep.system_instruction());

        let pro = compose(&[], "hi", ChatMode::Pro, None).unwrap();
        assert!(!pro.use_search);
        assert_eq!(pro.system_instruction, ChatMode::Pro.system_instruction());
    }

    #[test]
    fn test_compose_is_deterministic() {
        let history = history_pair();
        let att = Attachment::text("doc.txt", "content");

        let a = compose(&history, "again", ChatMode::Deep, Some(&att)).unwrap();
        let b = compose(&history, "again", ChatMode::Deep, Some(&att)).unwrap();

        assert_eq!(
            serde_json::to_string(&a.contents).unwrap(),
            serde_json::to_string(&b.contents).unwrap()
        );
        assert_eq!(a.system_instruction, b.system_instruction);
        assert_eq!(a.use_search, b.use_search);
    }

    #[test]
    fn test_compose_image_without_mime_type_is_error() {
        let att = Attachment {
            kind: AttachmentKind::Image,
            file_name: "pic.png".to_string(),
            data: "QQ==".to_string(),
            mime_type: None,
        };
        assert!(compose(&[], "what?", ChatMode::Normal, Some(&att)).is_err());
    }
}
