//! paper2notion AI — language model backend and the paper tasks built on it.

pub mod backend;
pub mod error;
pub mod tasks;

pub use backend::{Document, GeminiBackend, GenerateRequest, LanguageModel};
pub use error::{LlmError, Result};
pub use tasks::{extract_metadata, summarize, translate_abstract};
