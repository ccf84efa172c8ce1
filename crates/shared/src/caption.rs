use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyndicationError};

pub const OPENAI_API_BASE: &str = "https://api.openai.com";
pub const DEFAULT_CAPTION_MODEL: &str = "gpt-4o";

pub const IMAGE_PROMPT: &str = "Short, engaging description for this image (for a tweet, under 150 chars). If it's a vehicle, try to ID make/model. The image will be attached.";
pub const WEBPAGE_PROMPT: &str = "Concise summary of this webpage screenshot (for a tweet, 1-2 sentences). Mention products/brands if clear. Screenshot attached.";

pub const NO_KEY_FALLBACK: &str = "AI description unavailable (no API key).";
pub const UNAVAILABLE_FALLBACK: &str = "AI description currently unavailable.";

/// Produces a short description of an image. Never fails: problems turn into
/// fallback text.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate(&self, media_ref: &str, prompt: &str) -> String;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiCaptioner {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiCaptioner {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, model, OPENAI_API_BASE)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn try_generate(&self, media_ref: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SyndicationError::ConfigurationGap {
                capability: "caption generation",
                credential: "OPENAI_API_KEY",
            })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: media_ref },
                    },
                ],
            }],
            max_tokens: 120,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SyndicationError::CaptionUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(SyndicationError::CaptionUnavailable(format!(
                "OpenAI API error: {} - {}",
                status, error_text
            )));
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| SyndicationError::CaptionUnavailable(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| SyndicationError::CaptionUnavailable("empty completion".to_string()))
    }
}

#[async_trait]
impl CaptionGenerator for OpenAiCaptioner {
    async fn generate(&self, media_ref: &str, prompt: &str) -> String {
        match self.try_generate(media_ref, prompt).await {
            Ok(caption) => caption,
            Err(e @ SyndicationError::ConfigurationGap { .. }) => {
                tracing::warn!(error = %e, "Skipping caption");
                NO_KEY_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::warn!(media_ref, error = %e, "Error calling OpenAI");
                UNAVAILABLE_FALLBACK.to_string()
            }
        }
    }
}
