//! One-shot code generation
//!
//! A separate surface from the conversation: a single prompt produces a
//! single-file code implementation, with no history, no persistence, and no
//! search tooling. The instruction forces the model to answer with nothing
//! but a fenced code block, and the fence is stripped before the code is
//! returned.

use crate::error::Result;
use crate::providers::{Content, GenerationRequest, Provider};

const SYSTEM_INSTRUCTION_CODE: &str = "You are Talvi Code Generator. Your response MUST ONLY \
    contain the complete code block requested by the user, wrapped in appropriate language \
    markdown (e.g., ```html, ```javascript). Provide NO additional conversational text, \
    introductions, or explanations outside the code block.";

/// Strip a surrounding markdown fence, keeping the body
///
/// The opening fence line (including any language tag) and a trailing
/// fence are removed; text without fences passes through untouched.
fn strip_code_fence(text: &str) -> String {
    let mut code = text.trim();
    if code.starts_with("```") {
        code = match code.find('\n') {
            Some(pos) => &code[pos + 1..],
            None => "",
        };
    }
    code = code.strip_suffix("```").unwrap_or(code);
    code.trim().to_string()
}

/// Generate a single-file code implementation
///
/// # Arguments
///
/// * `provider` - Generation backend
/// * `language` - Target language, interpolated into the prompt
/// * `prompt` - What to build
///
/// # Errors
///
/// Propagates generation failures; unlike a chat turn there is no
/// conversation to absorb the error into.
pub async fn generate_code(
    provider: &dyn Provider,
    language: &str,
    prompt: &str,
) -> Result<String> {
    let full_prompt = format!(
        "Generate a complete, single-file code implementation for the following request in {}: {}",
        language, prompt
    );

    let request = GenerationRequest {
        contents: vec![Content::user(full_prompt)],
        system_instruction: SYSTEM_INSTRUCTION_CODE.to_string(),
        use_search: false,
    };

    let generation = provider.generate(&request).await?;
    Ok(strip_code_fence(&generation.text))
}
