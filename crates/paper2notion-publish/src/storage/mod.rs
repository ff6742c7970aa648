pub mod dropbox;
pub mod notion_upload;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use dropbox::{DropboxAuth, DropboxClient, DropboxStorage};
pub use notion_upload::NotionFileStorage;

/// Where an uploaded PDF can be found again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileReference {
    /// Durable shareable URL.
    External { url: String, name: String },
    /// Opaque upload id issued by the publishing service.
    Uploaded { id: String, name: String },
}

impl FileReference {
    pub fn name(&self) -> &str {
        match self {
            Self::External { name, .. } | Self::Uploaded { name, .. } => name,
        }
    }
}

/// Cloud storage for the source PDF.
#[async_trait]
pub trait FileStorage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store `bytes` under `file_name`. Storing the same name again overwrites.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<FileReference>;
}
