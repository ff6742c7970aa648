use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

/// Resolver and scheme prefixes stripped before validation.
const DOI_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "DOI:",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doi {
    /// Bare `10.xxxx/suffix` form, lowercased.
    pub normalized: String,
    /// `https://doi.org/` resolver URL.
    pub url: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let bare = DOI_PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .map(str::trim_start)
            .unwrap_or(input);

        let valid = bare.starts_with("10.")
            && bare
                .split_once('/')
                .is_some_and(|(_, suffix)| !suffix.trim().is_empty());
        if !valid {
            return Err(ScienceError::InvalidDoi(input.to_string()));
        }

        let normalized = bare.to_lowercase();
        Ok(Self {
            url: format!("https://doi.org/{normalized}"),
            normalized,
        })
    }
}
