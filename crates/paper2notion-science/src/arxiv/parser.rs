use chrono::{DateTime, Datelike};
use paper2notion_core::PaperMetadata;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::{Result, ScienceError};

/// Journal label used for every arXiv record.
pub const ARXIV_JOURNAL: &str = "arXiv";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

/// One `<entry>` of an arXiv Atom feed, whitespace-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    /// Entry `<id>`, the canonical abs URL including version.
    pub id_url: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: String,
}

impl ArxivEntry {
    /// Year of first publication, `0` if `published` is unusable.
    pub fn year(&self) -> i32 {
        DateTime::parse_from_rfc3339(self.published.trim())
            .map(|dt| dt.year())
            .ok()
            .or_else(|| self.published.trim().get(..4).and_then(|y| y.parse().ok()))
            .unwrap_or(0)
    }

    pub fn into_metadata(self) -> PaperMetadata {
        PaperMetadata {
            year: self.year(),
            title: self.title,
            authors: self.authors.join(", "),
            journals: ARXIV_JOURNAL.to_string(),
            doi: self.id_url,
            abstract_text: self.summary,
        }
    }
}

pub fn parse_atom_response(xml: &str) -> Result<Vec<ArxivEntry>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| ArxivEntry {
            id_url: entry.id.trim().to_string(),
            title: clean_text(&entry.title),
            authors: entry
                .authors
                .iter()
                .map(|author| clean_text(&author.name))
                .filter(|name| !name.is_empty())
                .collect(),
            summary: clean_text(&entry.summary),
            published: entry.published.trim().to_string(),
        })
        .collect())
}

fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
