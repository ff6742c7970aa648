use serde::de::DeserializeOwned;

use crate::error::{Result, ScienceError};

pub const DEFAULT_USER_AGENT: &str = concat!("paper2notion/", env!("CARGO_PKG_VERSION"));

// ─── ApiClient ────────────────────────────────────────────────────────────────

/// Thin wrapper over `reqwest::Client` for the read-only registry APIs.
///
/// One request per call, no retries: a non-success status becomes
/// [`ScienceError::ApiStatus`] and callers decide whether that is fatal.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_query(url, &[]).await
    }

    pub async fn get_with_query(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        tracing::debug!(url, "GET");
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScienceError::ApiStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_query(url, &[]).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let text = self.get_with_query(url, query).await?;
        serde_json::from_str(&text).map_err(|e| ScienceError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn non_success_status_is_api_status_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("Resource not found.")
            .create_async()
            .await;

        let client = ApiClient::new(DEFAULT_USER_AGENT).unwrap();
        let err = client
            .get(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        match err {
            ScienceError::ApiStatus { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Resource not found.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn get_json_parses_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(DEFAULT_USER_AGENT).unwrap();
        let value: serde_json::Value = client.get_json(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(value["status"], "ok");
    }
}
