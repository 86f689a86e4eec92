//! Google Generative AI (Gemini) API client

use crate::{
    error::{Error, Result},
    types::{InlineImage, ModelConfig},
};
use serde::{Deserialize, Serialize};

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: ModelConfig,
}

impl GeminiClient {
    /// Create a new client with an API key and the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, ModelConfig::default())
    }

    /// Create a new client with an explicit model configuration
    pub fn with_model(api_key: impl Into<String>, model: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model,
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// The configured model
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Run one synchronous generation: instruction text plus zero or more
    /// inline images, with the hosted web-search tool available to the model.
    /// Returns the concatenated text of the first candidate.
    pub async fn generate(&self, instruction: &str, images: &[InlineImage]) -> Result<String> {
        let request = build_request(instruction, images, &self.model);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.model.base_url, self.model.id, self.api_key
        );

        tracing::debug!(model = %self.model.id, images = images.len(), "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Error::api(status.as_u16(), message));
        }

        let parsed: GeminiResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn build_request(instruction: &str, images: &[InlineImage], model: &ModelConfig) -> GeminiRequest {
    let mut parts = vec![GeminiPart::Text {
        text: instruction.to_string(),
    }];
    for image in images {
        parts.push(GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
    }

    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts,
        }],
        tools: Some(vec![GeminiTool {
            google_search: GoogleSearch {},
        }]),
        generation_config: model.max_output_tokens.map(|max| GeminiGenerationConfig {
            max_output_tokens: Some(max),
        }),
    }
}

fn extract_text(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::UnexpectedResponse(
            "candidate carried no text parts".to_string(),
        ));
    }
    Ok(text)
}

// Request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// Response types

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
