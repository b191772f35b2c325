//! Attachment encoding
//!
//! Converts a user-selected file into a transport-ready payload: images
//! become base64 data tagged with their mime type, plain-text documents
//! become decoded text. Any other file type is rejected silently (no
//! attachment is produced). Reads go through tokio so the caller is never
//! blocked; the encoded value is the only side effect.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of attachment payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Base64-encoded image data
    Image,
    /// Decoded plain-text document content
    Text,
}

/// A transport-ready attachment payload
///
/// Owned exclusively by the message that carries it; never mutated after
/// creation. `mime_type` is present iff the kind is `Image`, and the image
/// payload carries no data-URL prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Payload kind
    pub kind: AttachmentKind,
    /// Original file name, for display
    pub file_name: String,
    /// Base64 payload (image) or decoded text content (text)
    pub data: String,
    /// Image mime type (e.g. "image/png"); `None` for text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Attachment {
    /// Create an image attachment from raw bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use talvi::attachment::{Attachment, AttachmentKind};
    ///
    /// let att = Attachment::image("photo.png", "image/png", &[0x89, 0x50]);
    /// assert_eq!(att.kind, AttachmentKind::Image);
    /// assert_eq!(att.mime_type.as_deref(), Some("image/png"));
    /// ```
    pub fn image(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            kind: AttachmentKind::Image,
            file_name: file_name.into(),
            data: BASE64.encode(bytes),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Create a plain-text attachment from decoded content
    pub fn text(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            file_name: file_name.into(),
            data: content.into(),
            mime_type: None,
        }
    }
}

/// Encode a selected file into an attachment
///
/// Classifies the file by content: recognized image formats produce an
/// `Image` attachment, `.txt` files with valid UTF-8 content produce a
/// `Text` attachment, and everything else yields `Ok(None)` so the caller
/// leaves the input unattached.
///
/// # Examples
///
/// ```no_run
/// # tokio_test::block_on(async {
/// use talvi::attachment::encode_file;
///
/// if let Some(att) = encode_file("notes.txt").await? {
///     println!("attached {}", att.file_name);
/// }
/// # Ok::<(), anyhow::Error>(())
/// # });
/// ```
///
/// # Errors
///
/// Returns an error only when the file cannot be read at all; an
/// unsupported type is not an error.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<Option<Attachment>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "attachment".to_string());

    if let Ok(format) = image::guess_format(&bytes) {
        return Ok(Some(Attachment::image(
            file_name,
            format.to_mime_type(),
            &bytes,
        )));
    }

    let is_txt = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if is_txt {
        match String::from_utf8(bytes) {
            Ok(content) => return Ok(Some(Attachment::text(file_name, content))),
            Err(_) => {
                tracing::debug!("Rejecting non-UTF-8 text attachment: {}", path.display());
                return Ok(None);
            }
        }
    }

    tracing::debug!("Rejecting unsupported attachment type: {}", path.display());
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Minimal valid PNG header followed by filler; enough for format
    /// detection without being a decodable image.
    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0x00; 64]);
        bytes
    }

    #[tokio::test]
    async fn test_encode_image_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pic.png");
        tokio::fs::write(&path, png_bytes()).await.expect("write");

        let att = encode_file(&path).await.expect("encode").expect("some");
        assert_eq!(att.kind, AttachmentKind::Image);
        assert_eq!(att.file_name, "pic.png");
        assert_eq!(att.mime_type.as_deref(), Some("image/png"));
        assert!(!att.data.is_empty());
        // No data-URL prefix on the payload.
        assert!(!att.data.starts_with("data:"));
    }

    #[tokio::test]
    async fn test_encode_text_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "hello attachment").await.expect("write");

        let att = encode_file(&path).await.expect("encode").expect("some");
        assert_eq!(att.kind, AttachmentKind::Text);
        assert_eq!(att.file_name, "notes.txt");
        assert_eq!(att.data, "hello attachment");
        assert!(att.mime_type.is_none());
    }

    #[tokio::test]
    async fn test_encode_unsupported_type_is_silent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("blob.bin");
        tokio::fs::write(&path, [0x00, 0x01, 0x02, 0x03])
            .await
            .expect("write");

        let result = encode_file(&path).await.expect("encode");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_encode_non_utf8_txt_is_silent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.txt");
        tokio::fs::write(&path, [0xFF, 0xFE, 0x00, 0x80])
            .await
            .expect("write");

        let result = encode_file(&path).await.expect("encode");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_encode_missing_file_is_error() {
        let dir = tempdir().expect("tempdir");
        let result = encode_file(dir.path().join("absent.txt")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_image_payload_roundtrip_preserves_length() {
        let bytes = png_bytes();
        let att = Attachment::image("pic.png", "image/png", &bytes);

        let decoded = BASE64.decode(&att.data).expect("decode");
        assert_eq!(decoded.len(), bytes.len());
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn test_text_constructor() {
        let att = Attachment::text("doc.txt", "content");
        assert_eq!(att.kind, AttachmentKind::Text);
        assert_eq!(att.data, "content");
        assert!(att.mime_type.is_none());
    }

    #[test]
    fn test_attachment_serialization_omits_missing_mime() {
        let att = Attachment::text("doc.txt", "content");
        let json = serde_json::to_string(&att).unwrap();
        assert!(!json.contains("mime_type"));

        let att = Attachment::image("p.png", "image/png", &[1, 2, 3]);
        let json = serde_json::to_string(&att).unwrap();
        assert!(json.contains("\"mime_type\":\"image/png\""));
    }
}
