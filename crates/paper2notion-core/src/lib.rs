//! paper2notion core — paper metadata, summary blocks, config, token store.

pub mod blocks;
pub mod config;
pub mod error;
pub mod models;
pub mod token_store;

pub use blocks::{ContentBlock, HEADING_MARKER, split_sections, to_markdown};
pub use config::AppConfig;
pub use error::{CoreError, ExitCode, Result};
pub use models::*;
pub use token_store::TokenStore;
