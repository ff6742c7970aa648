use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

// YYMM.NNNN[N] with optional version
static NEW_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}\.\d{4,5})(?:v(\d+))?$").expect("valid regex"));

// archive[.SUBJ]/YYMMNNN with optional version
static OLD_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z\-]+(?:\.[A-Z]{2})?/\d{7})(?:v(\d+))?$").expect("valid regex")
});

const ARXIV_URL_PREFIXES: [&str; 4] = [
    "https://arxiv.org/abs/",
    "http://arxiv.org/abs/",
    "https://arxiv.org/pdf/",
    "http://arxiv.org/pdf/",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArxivId {
    pub id: String,
    pub version: Option<u32>,
}

impl ArxivId {
    /// Parse a bare id, an `arXiv:` labelled id, or an abs/pdf URL.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let mut rest = ARXIV_URL_PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .map(|s| s.trim_end_matches(".pdf"))
            .unwrap_or(input);
        if rest.get(..6).is_some_and(|label| label.eq_ignore_ascii_case("arxiv:")) {
            rest = rest[6..].trim_start();
        }

        let caps = NEW_STYLE
            .captures(rest)
            .or_else(|| OLD_STYLE.captures(rest))
            .ok_or_else(|| ScienceError::InvalidArxivId(input.to_string()))?;

        Ok(Self {
            id: caps[1].to_string(),
            version: caps.get(2).and_then(|v| v.as_str().parse().ok()),
        })
    }

    /// Id as sent to the feed, version included when known.
    pub fn query_id(&self) -> String {
        match self.version {
            Some(v) => format!("{}v{v}", self.id),
            None => self.id.clone(),
        }
    }

    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.id)
    }
}
