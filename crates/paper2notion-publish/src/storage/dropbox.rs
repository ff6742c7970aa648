//! Dropbox upload, shared links and the authorization-code exchange.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{PublishError, Result};
use crate::storage::{FileReference, FileStorage};

const SERVICE: &str = "dropbox";

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com/2";
pub const AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
pub const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct DropboxClient {
    access_token: String,
    api_url: String,
    content_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SharedLinkList {
    #[serde(default)]
    links: Vec<SharedLink>,
}

impl DropboxClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_urls(access_token, DEFAULT_API_URL, DEFAULT_CONTENT_URL)
    }

    pub fn with_urls(access_token: impl Into<String>, api_url: &str, content_url: &str) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
            content_url: content_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Upload in overwrite mode.
    pub async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let arg = header_safe_json(&json!({ "path": path, "mode": "overwrite" }));
        let resp = self
            .client
            .post(format!("{}/files/upload", self.content_url))
            .bearer_auth(&self.access_token)
            .header("Dropbox-API-Arg", arg)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;
        ensure_success(resp).await?;
        debug!(path, size = bytes.len(), "dropbox upload done");
        Ok(())
    }

    /// Existing shared link for `path`, or a newly created one.
    pub async fn shared_link(&self, path: &str) -> Result<String> {
        if let Some(url) = self.list_shared_link(path, true).await? {
            return Ok(url);
        }

        let resp = self
            .client
            .post(format!("{}/sharing/create_shared_link_with_settings", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&json!({ "path": path }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status == 200 {
            let link: SharedLink = serde_json::from_str(&body)?;
            return Ok(link.url);
        }

        // Lost a race with another link creation: fall back to whatever exists.
        if status == 409 && body.contains("shared_link_already_exists") {
            let existing = serde_json::from_str::<Value>(&body).ok().and_then(|v| {
                v["error"]["shared_link_already_exists"]["metadata"]["url"]
                    .as_str()
                    .map(str::to_string)
            });
            if let Some(url) = existing {
                return Ok(url);
            }
            return self
                .list_shared_link(path, false)
                .await?
                .ok_or(PublishError::MalformedResponse {
                    service: SERVICE,
                    field: "links",
                });
        }

        Err(PublishError::Api {
            service: SERVICE,
            status,
            body,
        })
    }

    async fn list_shared_link(&self, path: &str, direct_only: bool) -> Result<Option<String>> {
        let resp = self
            .client
            .post(format!("{}/sharing/list_shared_links", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&json!({ "path": path, "direct_only": direct_only }))
            .send()
            .await?;
        let list: SharedLinkList = serde_json::from_str(&ensure_success(resp).await?)?;
        Ok(list.links.into_iter().next().map(|link| link.url))
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(PublishError::Api {
            service: SERVICE,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// JSON for an HTTP header value: non-ASCII characters escaped as `\uXXXX`.
fn header_safe_json(value: &Value) -> String {
    let mut out = String::new();
    for c in value.to_string().chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

/// Turn a preview link into one that serves the file itself.
pub fn raw_link(url: &str) -> String {
    if url.contains("?dl=0") {
        url.replace("?dl=0", "?raw=1")
    } else if url.contains("&dl=0") {
        url.replace("&dl=0", "&raw=1")
    } else {
        url.to_string()
    }
}

pub fn dropbox_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("/{file_name}")
    } else {
        format!("/{folder}/{file_name}")
    }
}

// ─── Storage ──────────────────────────────────────────────────────────────────

pub struct DropboxStorage {
    client: DropboxClient,
    folder: String,
}

impl DropboxStorage {
    pub fn new(client: DropboxClient, folder: impl Into<String>) -> Self {
        Self {
            client,
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl FileStorage for DropboxStorage {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<FileReference> {
        let path = dropbox_path(&self.folder, file_name);
        self.client.upload(&path, bytes).await?;
        let url = raw_link(&self.client.shared_link(&path).await?);
        info!(%path, %url, "stored PDF in dropbox");
        Ok(FileReference::External {
            url,
            name: file_name.to_string(),
        })
    }
}

// ─── Authorization code flow ──────────────────────────────────────────────────

/// App credentials for the manual code flow: open the URL, paste the code.
pub struct DropboxAuth {
    pub app_key: String,
    pub app_secret: String,
    pub redirect_uri: String,
    token_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl DropboxAuth {
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            redirect_uri: redirect_uri.into(),
            token_url: TOKEN_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token_url(mut self, token_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code",
            urlencoding::encode(&self.app_key),
            urlencoding::encode(&self.redirect_uri),
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code.trim()),
                ("client_id", self.app_key.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = serde_json::from_str(&ensure_success(resp).await?)?;
        Ok(token.access_token)
    }
}
