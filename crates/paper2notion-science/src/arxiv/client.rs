use crate::arxiv::parser::{ArxivEntry, parse_atom_response};
use crate::error::Result;
use crate::http::{ApiClient, DEFAULT_USER_AGENT};
use crate::identifiers::arxiv::ArxivId;

pub const DEFAULT_ARXIV_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: ApiClient,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_ARXIV_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(DEFAULT_USER_AGENT)?,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch the feed entry for `raw_id` (the text after the `arxiv:` marker).
    ///
    /// Ids that parse as arXiv ids are normalized first; anything else is
    /// sent to the feed untouched.
    pub async fn fetch_entry(&self, raw_id: &str) -> Result<Option<ArxivEntry>> {
        let query_id = ArxivId::parse(raw_id)
            .map(|id| id.query_id())
            .unwrap_or_else(|_| raw_id.trim().to_string());

        let xml = self
            .client
            .get_with_query(&self.base_url, &[("id_list", query_id.as_str())])
            .await?;
        Ok(parse_atom_response(&xml)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <published>2021-01-01T00:00:00Z</published>
    <title>A Test Paper</title>
    <summary>Abstract text.</summary>
    <author><name>Jane Doe</name></author>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn fetches_first_entry() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded("id_list".into(), "2101.00001".into()))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let client = ArxivClient::with_base_url(&format!("{}/api/query", server.url())).unwrap();
        let entry = client.fetch_entry("2101.00001").await.unwrap().unwrap();
        assert_eq!(entry.title, "A Test Paper");
        assert_eq!(entry.authors, vec!["Jane Doe".to_string()]);
    }

    #[tokio::test]
    async fn empty_feed_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
            .create_async()
            .await;

        let client = ArxivClient::with_base_url(&format!("{}/api/query", server.url())).unwrap();
        assert!(client.fetch_entry("9912.12345").await.unwrap().is_none());
    }
}
