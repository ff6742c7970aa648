use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::notion::NotionClient;
use crate::storage::{FileReference, FileStorage};

const PDF_MIME: &str = "application/pdf";

/// Stores the PDF with Notion itself; the page then references the upload id.
pub struct NotionFileStorage {
    client: NotionClient,
}

impl NotionFileStorage {
    pub fn new(client: NotionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileStorage for NotionFileStorage {
    fn name(&self) -> &'static str {
        "notion"
    }

    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<FileReference> {
        let upload = self.client.create_file_upload(file_name, PDF_MIME).await?;
        self.client
            .send_file_upload(&upload, file_name, PDF_MIME, bytes)
            .await?;
        info!(id = %upload.id, file_name, "stored PDF as notion upload");
        Ok(FileReference::Uploaded {
            id: upload.id,
            name: file_name.to_string(),
        })
    }
}
