//! Notion REST client: page creation and direct file uploads.

use async_trait::async_trait;
use paper2notion_core::config::NotionConfig;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PublishError, Result};
use crate::notion::payload::PageRequest;

const SERVICE: &str = "notion";

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_VERSION: &str = "2022-06-28";

/// Created page as reported back by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    #[serde(rename = "id")]
    pub page_id: String,
    #[serde(default)]
    pub url: String,
}

/// Pending upload slot returned by `POST /file_uploads`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileUpload {
    pub id: String,
    pub upload_url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, page: &PageRequest) -> Result<PublishReceipt>;
}

pub struct NotionClient {
    api_key: String,
    base_url: String,
    version: String,
    client: reqwest::Client,
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &NotionConfig, api_key: impl Into<String>) -> Self {
        let mut client = Self::new(api_key).with_base_url(&config.base_url);
        client.version = config.version.clone();
        client
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
    }

    pub async fn create_page(&self, page: &PageRequest) -> Result<PublishReceipt> {
        let url = format!("{}/pages", self.base_url);
        debug!(%url, blocks = page.children.len(), "creating notion page");
        let resp = self.post(&url).json(page).send().await?;
        let body = expect_ok(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn create_file_upload(&self, file_name: &str, content_type: &str) -> Result<FileUpload> {
        let url = format!("{}/file_uploads", self.base_url);
        let resp = self
            .post(&url)
            .json(&json!({
                "mode": "single_part",
                "filename": file_name,
                "content_type": content_type,
            }))
            .send()
            .await?;
        let body = expect_ok(resp).await?;
        let upload: FileUpload = serde_json::from_str(&body)?;
        if upload.upload_url.is_empty() {
            return Err(PublishError::MalformedResponse {
                service: SERVICE,
                field: "upload_url",
            });
        }
        Ok(upload)
    }

    pub async fn send_file_upload(
        &self,
        upload: &FileUpload,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let resp = self
            .post(&upload.upload_url)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        expect_ok(resp).await?;
        info!(id = %upload.id, size = bytes.len(), "notion file upload sent");
        Ok(())
    }
}

#[async_trait]
impl Publisher for NotionClient {
    async fn publish(&self, page: &PageRequest) -> Result<PublishReceipt> {
        let receipt = self.create_page(page).await?;
        info!(page_id = %receipt.page_id, "published notion page");
        Ok(receipt)
    }
}

async fn expect_ok(resp: reqwest::Response) -> Result<String> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    if status != 200 {
        return Err(PublishError::Api {
            service: SERVICE,
            status,
            body,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use paper2notion_core::config::NotionPropertyNames;
    use paper2notion_core::{ContentBlock, PaperMetadata};

    use crate::notion::payload::build_page;

    fn sample_page() -> PageRequest {
        let meta = PaperMetadata {
            title: "Deep Learning".to_string(),
            ..Default::default()
        };
        build_page(
            "db-1",
            &NotionPropertyNames::default(),
            &meta,
            &[ContentBlock::Paragraph("Body".to_string())],
            None,
        )
    }

    #[tokio::test]
    async fn publish_posts_page_with_version_header() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/pages")
            .match_header("authorization", "Bearer secret")
            .match_header("notion-version", DEFAULT_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "parent": {"database_id": "db-1"},
                "properties": {"Title": {"title": [{"text": {"content": "Deep Learning"}}]}}
            })))
            .with_status(200)
            .with_body(r#"{"object":"page","id":"page-1","url":"https://www.notion.so/page-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = NotionClient::new("secret").with_base_url(&server.url());
        let receipt = client.publish(&sample_page()).await.unwrap();
        assert_eq!(receipt.page_id, "page-1");
        assert_eq!(receipt.url, "https://www.notion.so/page-1");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_carries_status_and_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/pages")
            .with_status(400)
            .with_body(r#"{"object":"error","code":"validation_error","message":"Year is not a property"}"#)
            .create_async()
            .await;

        let client = NotionClient::new("secret").with_base_url(&server.url());
        match client.publish(&sample_page()).await.unwrap_err() {
            PublishError::Api { service, status, body } => {
                assert_eq!(service, "notion");
                assert_eq!(status, 400);
                assert!(body.contains("validation_error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn file_upload_is_created_then_sent() {
        let mut server = Server::new_async().await;
        let send_url = format!("{}/file_uploads/up-1/send", server.url());
        let create = server
            .mock("POST", "/file_uploads")
            .match_body(Matcher::PartialJson(json!({"filename": "paper.pdf", "content_type": "application/pdf"})))
            .with_status(200)
            .with_body(json!({"id": "up-1", "status": "pending", "upload_url": send_url}).to_string())
            .create_async()
            .await;
        let send = server
            .mock("POST", "/file_uploads/up-1/send")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::Regex("%PDF-1.4".to_string()))
            .with_status(200)
            .with_body(r#"{"id":"up-1","status":"uploaded"}"#)
            .create_async()
            .await;

        let client = NotionClient::new("secret").with_base_url(&server.url());
        let upload = client.create_file_upload("paper.pdf", "application/pdf").await.unwrap();
        assert_eq!(upload.id, "up-1");
        client
            .send_file_upload(&upload, "paper.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();

        create.assert_async().await;
        send.assert_async().await;
    }
}
