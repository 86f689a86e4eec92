//! Core types for inference requests

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// An image attachment, base64 encoded for inline transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineImage {
    /// Base64 encoded image bytes
    pub data: String,
    /// MIME type (e.g. "image/png")
    pub mime_type: String,
}

impl InlineImage {
    /// Encode raw image bytes for transport
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

/// Model selection and endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g. "gemini-2.0-flash-exp")
    pub id: String,
    /// Base URL for API calls
    pub base_url: String,
    /// Maximum output tokens per response
    pub max_output_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_output_tokens: None,
        }
    }
}

impl ModelConfig {
    /// Use a different model id with the default endpoint
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
