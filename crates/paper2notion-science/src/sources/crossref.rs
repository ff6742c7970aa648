use once_cell::sync::Lazy;
use paper2notion_core::PaperMetadata;
use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::http::{ApiClient, DEFAULT_USER_AGENT};
use crate::identifiers::doi::Doi;

pub const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";

static XML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));

pub struct CrossRefSource {
    client: ApiClient,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(polite_email: Option<String>) -> Result<Self> {
        Self::with_params(DEFAULT_CROSSREF_URL, polite_email)
    }

    pub fn with_params(base_url: &str, polite_email: Option<String>) -> Result<Self> {
        // CrossRef routes requests carrying a mailto to its "polite" pool.
        let user_agent = match &polite_email {
            Some(email) => format!("{DEFAULT_USER_AGENT} (mailto:{email})"),
            None => DEFAULT_USER_AGENT.to_string(),
        };

        Ok(Self {
            client: ApiClient::new(&user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_by_doi(&self, doi: &str) -> Result<CrossRefWork> {
        let doi = Doi::parse(doi)
            .map(|d| d.normalized)
            .unwrap_or_else(|_| doi.trim().to_string());
        let url = format!("{}/works/{}", self.base_url, urlencoding::encode(&doi));
        let envelope: Envelope<CrossRefWork> = self.client.get_json(&url).await?;
        Ok(envelope.message)
    }

    /// DOI of the most relevant work for `title`, if CrossRef returns any.
    pub async fn search_doi_by_title(&self, title: &str) -> Result<Option<String>> {
        let url = format!("{}/works", self.base_url);
        let envelope: Envelope<SearchMessage> = self
            .client
            .get_json_with_query(
                &url,
                &[("query.title", title), ("rows", "1"), ("sort", "relevance")],
            )
            .await?;

        Ok(envelope
            .message
            .items
            .into_iter()
            .next()
            .map(|item| item.doi)
            .filter(|doi| !doi.trim().is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    message: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchMessage {
    items: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchItem {
    #[serde(rename = "DOI")]
    doi: String,
}

/// The subset of a CrossRef `work` record this tool consumes.
///
/// CrossRef sends `[]` rather than omitting `title` or `container-title`, so
/// both stay vectors and are read through `first()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrossRefWork {
    #[serde(rename = "DOI")]
    pub doi: String,
    pub title: Vec<String>,
    pub author: Vec<CrossRefAuthor>,
    #[serde(rename = "container-title")]
    pub container_title: Vec<String>,
    #[serde(rename = "published-print")]
    pub published_print: Option<DateParts>,
    #[serde(rename = "published-online")]
    pub published_online: Option<DateParts>,
    pub issued: Option<DateParts>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrossRefAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateParts {
    #[serde(rename = "date-parts")]
    pub date_parts: Vec<Vec<Option<i64>>>,
}

impl DateParts {
    fn year(&self) -> Option<i32> {
        self.date_parts
            .first()
            .and_then(|parts| parts.first().copied().flatten())
            .and_then(|y| i32::try_from(y).ok())
    }
}

impl CrossRefAuthor {
    /// `"Given Family"`, falling back to the organisation `name`.
    pub fn display_name(&self) -> String {
        let joined = format!(
            "{} {}",
            self.given.as_deref().unwrap_or_default(),
            self.family.as_deref().unwrap_or_default()
        );
        let joined = joined.trim();
        if joined.is_empty() {
            self.name.clone().unwrap_or_default().trim().to_string()
        } else {
            joined.to_string()
        }
    }
}

impl CrossRefWork {
    // CrossRef date parts: "published-print": {"date-parts": [[2017, 6, 12]]}
    pub fn published_year(&self) -> Option<i32> {
        [&self.published_print, &self.published_online, &self.issued]
            .into_iter()
            .flatten()
            .find_map(DateParts::year)
    }

    pub fn into_metadata(self) -> PaperMetadata {
        let authors = self
            .author
            .iter()
            .map(CrossRefAuthor::display_name)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let doi = match Doi::parse(&self.doi) {
            Ok(parsed) => parsed.url,
            Err(_) => self.doi.trim().to_string(),
        };

        PaperMetadata {
            year: self.published_year().unwrap_or(0),
            title: self.title.first().map(|t| t.trim().to_string()).unwrap_or_default(),
            authors,
            journals: self
                .container_title
                .first()
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            doi,
            abstract_text: self.abstract_text.as_deref().map(strip_jats).unwrap_or_default(),
        }
    }
}

/// Drop JATS markup (`<jats:p>` and friends) and collapse whitespace.
fn strip_jats(raw: &str) -> String {
    XML_TAG_RE
        .replace_all(raw, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
