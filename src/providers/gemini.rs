//! Gemini provider implementation
//!
//! Talks to a Gemini-style `generateContent` endpoint over HTTPS. The same
//! endpoint family serves both text generation (with optional search
//! grounding) and speech synthesis (audio response modality with a prebuilt
//! voice), so both live here.

use crate::config::ProviderConfig;
use crate::error::{Result, TalviError};
use crate::providers::base::{Content, Generation, GenerationRequest, Provider, Source};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gemini API provider
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    tts_model: String,
    tts_voice: String,
}

/// Wire request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// System instruction in wire form: a bare parts list
#[derive(Debug, Serialize)]
struct WireInstruction {
    parts: Vec<WireTextPart>,
}

impl WireInstruction {
    fn from_text(text: &str) -> Self {
        Self {
            parts: vec![WireTextPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTextPart {
    text: String,
}

/// Tool attachment; only the search tool is ever sent
#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: serde_json::Value,
}

impl Tool {
    fn search() -> Self {
        Self {
            google_search: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

/// Wire response body for `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
struct ResponseInlineData {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider from configuration
    ///
    /// The API key is taken from the config when set, otherwise from the
    /// environment variable named by `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns a missing-credentials error when no API key can be found
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => std::env::var(&config.api_key_env).map_err(|_| {
                TalviError::MissingCredentials(format!(
                    "No API key in config and {} is not set",
                    config.api_key_env
                ))
            })?,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            tts_model: config.tts_model.clone(),
            tts_voice: config.tts_voice.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn post_generate(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TalviError::Provider(format!(
                "Generation API returned {}: {}",
                status, text
            ))
            .into());
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        Ok(parsed)
    }
}

/// Extract the concatenated text of the first candidate
fn candidate_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.as_deref())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Extract grounding citations from the first candidate
///
/// Chunks without a web URI are dropped; a missing title falls back to
/// the URI so every citation stays renderable.
fn candidate_sources(response: &GenerateContentResponse) -> Vec<Source> {
    response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|c| c.grounding_metadata.as_ref())
        .and_then(|m| m.grounding_chunks.as_deref())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = chunk.web.as_ref()?;
                    let uri = web.uri.clone()?;
                    let title = web.title.clone().unwrap_or_else(|| uri.clone());
                    Some(Source { uri, title })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let tools = if request.use_search {
            Some(vec![Tool::search()])
        } else {
            None
        };

        let body = GenerateContentRequest {
            contents: &request.contents,
            system_instruction: Some(WireInstruction::from_text(&request.system_instruction)),
            tools,
            generation_config: None,
        };

        tracing::debug!(
            "Sending generation request: model={} contents={} search={}",
            self.model,
            request.contents.len(),
            request.use_search
        );

        let response = self.post_generate(&self.model, &body).await?;

        let text = candidate_text(&response);
        if text.is_empty() {
            return Err(
                TalviError::Provider("Generation response contained no text".to_string()).into(),
            );
        }

        Ok(Generation::with_sources(text, candidate_sources(&response)))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<String> {
        let contents = vec![Content::user(text)];
        let body = GenerateContentRequest {
            contents: &contents,
            system_instruction: None,
            tools: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.tts_voice.clone(),
                        },
                    },
                },
            }),
        };

        let response = self.post_generate(&self.tts_model, &body).await?;

        response
            .candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_deref())
            .and_then(|parts| parts.first())
            .and_then(|p| p.inline_data.as_ref())
            .and_then(|d| d.data.clone())
            .ok_or_else(|| {
                TalviError::Speech("Speech response contained no audio data".to_string()).into()
            })
    }
}
