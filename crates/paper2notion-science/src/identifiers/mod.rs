pub mod arxiv;
pub mod doi;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use arxiv::ArxivId;
pub use doi::Doi;

/// Marker that routes an identifier to the arXiv feed.
pub const ARXIV_MARKER: &str = "arxiv:";

/// A registry identifier, resolved once at the boundary.
///
/// Anything carrying the `arxiv:` marker (case-insensitive) goes to the
/// arXiv feed; every other string is treated as a DOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PaperIdentifier {
    Arxiv(String),
    Doi(String),
}

impl PaperIdentifier {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.get(..ARXIV_MARKER.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(ARXIV_MARKER) => {
                Self::Arxiv(input[ARXIV_MARKER.len()..].trim().to_string())
            }
            _ => Self::Doi(input.to_string()),
        }
    }

    pub fn is_arxiv(&self) -> bool {
        matches!(self, Self::Arxiv(_))
    }

    /// True when nothing is left to look up (`""`, `"   "`, `"arxiv:"`).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Arxiv(value) | Self::Doi(value) => value.trim().is_empty(),
        }
    }
}

impl fmt::Display for PaperIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arxiv(id) => write!(f, "arXiv:{id}"),
            Self::Doi(doi) => f.write_str(doi),
        }
    }
}
