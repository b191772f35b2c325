//! One-shot code generation handler
//!
//! Sends a single code request to the provider and prints the generated
//! file. The history log records the request and a completion marker
//! rather than the code itself; generated code goes to stdout where it can
//! be redirected.

use crate::chat::codegen::generate_code;
use crate::chat::ChatMessage;
use crate::chat_mode::ChatMode;
use crate::error::Result;
use crate::providers::Provider;
use crate::storage::{SqliteStorage, StoredMessage};
use colored::Colorize;

/// Handle the `code` command
///
/// # Arguments
///
/// * `provider` - Generation backend
/// * `storage` - History store for the request markers
/// * `user_id` - Owner of the persisted markers
/// * `language` - Target language for the generated file
/// * `prompt` - What to build
pub async fn handle_code(
    provider: &dyn Provider,
    storage: &SqliteStorage,
    user_id: &str,
    language: &str,
    prompt: &str,
) -> Result<()> {
    tracing::info!("Generating {} code", language);

    let request_marker = ChatMessage::user(format!("CODE REQUEST: {} - {}", language, prompt), None);
    let request_row = StoredMessage::user_row(user_id, &request_marker, ChatMode::Pro);
    if let Err(e) = storage.insert_message(&request_row) {
        tracing::warn!("Failed to persist code request: {}", e);
    }

    let code = match generate_code(provider, language, prompt).await {
        Ok(code) => code,
        Err(e) => {
            println!("{}", format!("Code generation failed: {}", e).red());
            return Ok(());
        }
    };

    println!("{}", code);

    let mut done_marker = ChatMessage::placeholder();
    done_marker.resolve("CODE OUTPUT GENERATED.".to_string(), Vec::new());
    match StoredMessage::model_row(user_id, &done_marker, ChatMode::Pro) {
        Ok(done_row) => {
            if let Err(e) = storage.insert_message(&done_row) {
                tracing::warn!("Failed to persist code marker: {}", e);
            }
        }
        Err(e) => tracing::warn!("Failed to encode code marker: {}", e),
    }

    Ok(())
}
