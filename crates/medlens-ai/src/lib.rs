//! medlens-ai: Google Gemini inference client
//!
//! A thin client for the Gemini `generateContent` API covering the one shape
//! of call medlens makes: a text instruction plus inline image attachments,
//! with the hosted web-search tool enabled, returning the generated text.

pub mod error;
pub mod gemini;
pub mod types;

pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use types::*;
