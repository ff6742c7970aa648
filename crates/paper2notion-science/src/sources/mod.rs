pub mod crossref;

use async_trait::async_trait;
use paper2notion_core::PaperMetadata;
use paper2notion_core::config::RegistryConfig;
use tracing::{debug, warn};

use crate::arxiv::ArxivClient;
use crate::error::Result;
use crate::identifiers::PaperIdentifier;
use crate::sources::crossref::CrossRefSource;

/// Bibliographic registry: title search plus identifier lookup.
///
/// Both operations answer `None` for "nothing usable"; lookup failures never
/// escape this boundary.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn search_doi_by_title(&self, title: &str) -> Option<String>;
    async fn fetch_metadata(&self, id: &PaperIdentifier) -> Option<PaperMetadata>;
}

/// CrossRef for DOIs and title search, the arXiv feed for `arxiv:` ids.
pub struct ScholarlyRegistry {
    crossref: CrossRefSource,
    arxiv: ArxivClient,
}

impl ScholarlyRegistry {
    pub fn new(crossref: CrossRefSource, arxiv: ArxivClient) -> Self {
        Self { crossref, arxiv }
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Ok(Self::new(
            CrossRefSource::with_params(&config.crossref_base_url, config.polite_email.clone())?,
            ArxivClient::with_base_url(&config.arxiv_base_url)?,
        ))
    }
}

#[async_trait]
impl Registry for ScholarlyRegistry {
    async fn search_doi_by_title(&self, title: &str) -> Option<String> {
        match self.crossref.search_doi_by_title(title).await {
            Ok(doi) => {
                debug!(?doi, "crossref title search");
                doi
            }
            Err(err) => {
                warn!(error = %err, "crossref title search failed");
                None
            }
        }
    }

    async fn fetch_metadata(&self, id: &PaperIdentifier) -> Option<PaperMetadata> {
        let result = match id {
            PaperIdentifier::Arxiv(raw) => self
                .arxiv
                .fetch_entry(raw)
                .await
                .map(|entry| entry.map(|e| e.into_metadata())),
            PaperIdentifier::Doi(doi) => self
                .crossref
                .fetch_by_doi(doi)
                .await
                .map(|work| Some(work.into_metadata())),
        };

        match result {
            Ok(meta) => meta,
            Err(err) => {
                warn!(%id, error = %err, "registry lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn registry_for(server: &Server) -> ScholarlyRegistry {
        let config = RegistryConfig {
            crossref_base_url: server.url(),
            arxiv_base_url: format!("{}/api/query", server.url()),
            polite_email: None,
        };
        ScholarlyRegistry::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn arxiv_identifier_uses_feed() {
        let mut server = Server::new_async().await;
        let feed = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded("id_list".into(), "2101.00001".into()))
            .with_status(200)
            .with_body(
                r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
                <id>http://arxiv.org/abs/2101.00001v1</id>
                <published>2021-01-01T00:00:00Z</published>
                <title>Feed Title</title><summary>S</summary>
                <author><name>A B</name></author></entry></feed>"#,
            )
            .expect(1)
            .create_async()
            .await;
        let crossref = server
            .mock("GET", Matcher::Regex("^/works".into()))
            .expect(0)
            .create_async()
            .await;

        let registry = registry_for(&server);
        let meta = registry
            .fetch_metadata(&PaperIdentifier::parse("arxiv:2101.00001"))
            .await
            .unwrap();
        assert_eq!(meta.title, "Feed Title");
        assert_eq!(meta.journals, "arXiv");
        assert_eq!(meta.year, 2021);

        feed.assert_async().await;
        crossref.assert_async().await;
    }

    #[tokio::test]
    async fn failed_lookup_is_none_not_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex("^/works".into()))
            .with_status(404)
            .with_body("Resource not found.")
            .create_async()
            .await;

        let registry = registry_for(&server);
        assert!(registry
            .fetch_metadata(&PaperIdentifier::parse("10.9999/missing"))
            .await
            .is_none());
        assert!(registry.search_doi_by_title("anything").await.is_none());
    }
}
