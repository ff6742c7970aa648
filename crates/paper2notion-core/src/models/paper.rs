use serde::{Deserialize, Deserializer, Serialize};

/// Bibliographic record of one paper.
///
/// Every field defaults to its empty value; "unknown" is represented by
/// emptiness (`""` or a year of `0`), never by a separate null marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMetadata {
    pub title: String,
    /// Comma-joined `"Given Family"` names.
    pub authors: String,
    /// Comma-joined journal / venue names.
    pub journals: String,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    /// Identifier URL (`https://doi.org/...` or an arXiv abs URL).
    pub doi: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Field names checked by [`PaperMetadata::missing_fields`], in prompt order.
pub const EXTRACTABLE_FIELDS: [&str; 5] = ["title", "authors", "journals", "year", "abstract"];

impl PaperMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Names of the extractable fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        EXTRACTABLE_FIELDS
            .iter()
            .copied()
            .filter(|field| self.field_is_empty(field))
            .collect()
    }

    fn field_is_empty(&self, field: &str) -> bool {
        match field {
            "title" => self.title.trim().is_empty(),
            "authors" => self.authors.trim().is_empty(),
            "journals" => self.journals.trim().is_empty(),
            "year" => self.year == 0,
            "abstract" => self.abstract_text.trim().is_empty(),
            "doi" => self.doi.trim().is_empty(),
            _ => false,
        }
    }

    /// Copy every field of `other` into `self` where `self` is still empty.
    ///
    /// Returns the names of the fields that were filled.
    pub fn fill_missing_from(&mut self, other: &PaperMetadata) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if self.field_is_empty("title") && !other.field_is_empty("title") {
            self.title = other.title.clone();
            filled.push("title");
        }
        if self.field_is_empty("authors") && !other.field_is_empty("authors") {
            self.authors = other.authors.clone();
            filled.push("authors");
        }
        if self.field_is_empty("journals") && !other.field_is_empty("journals") {
            self.journals = other.journals.clone();
            filled.push("journals");
        }
        if self.year == 0 && other.year != 0 {
            self.year = other.year;
            filled.push("year");
        }
        if self.field_is_empty("doi") && !other.field_is_empty("doi") {
            self.doi = other.doi.clone();
            filled.push("doi");
        }
        if self.field_is_empty("abstract") && !other.field_is_empty("abstract") {
            self.abstract_text = other.abstract_text.clone();
            filled.push("abstract");
        }
        filled
    }

    pub fn author_list(&self) -> Vec<String> {
        split_comma_list(&self.authors)
    }

    pub fn journal_list(&self) -> Vec<String> {
        split_comma_list(&self.journals)
    }

    /// Year as an optional value; `0` means unknown.
    pub fn known_year(&self) -> Option<i32> {
        (self.year != 0).then_some(self.year)
    }
}

fn split_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// Language models occasionally answer `"2021"` or `null` for the year.
fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()).unwrap_or(0),
        serde_json::Value::String(s) => s
            .trim()
            .get(..4)
            .and_then(|prefix| prefix.parse::<i32>().ok())
            .unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let meta = PaperMetadata::default();
        assert!(meta.is_empty());
        assert_eq!(meta.missing_fields(), EXTRACTABLE_FIELDS.to_vec());
        assert_eq!(meta.known_year(), None);
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let meta: PaperMetadata =
            serde_json::from_str(r#"{"title": "Deep Nets", "abstract": "We study."}"#).unwrap();
        assert_eq!(meta.title, "Deep Nets");
        assert_eq!(meta.abstract_text, "We study.");
        assert_eq!(meta.year, 0);
        assert!(meta.authors.is_empty());
    }

    #[test]
    fn year_accepts_string_and_null() {
        let meta: PaperMetadata = serde_json::from_str(r#"{"year": "2019-05"}"#).unwrap();
        assert_eq!(meta.year, 2019);
        let meta: PaperMetadata = serde_json::from_str(r#"{"year": null}"#).unwrap();
        assert_eq!(meta.year, 0);
    }

    #[test]
    fn fill_missing_only_touches_empty_fields() {
        let mut base = PaperMetadata {
            title: "Registry Title".to_string(),
            year: 2020,
            ..Default::default()
        };
        let extracted = PaperMetadata {
            title: "Model Title".to_string(),
            authors: "Ada Lovelace".to_string(),
            year: 1999,
            abstract_text: "Abstract".to_string(),
            ..Default::default()
        };
        let filled = base.fill_missing_from(&extracted);
        assert_eq!(filled, vec!["authors", "abstract"]);
        assert_eq!(base.title, "Registry Title");
        assert_eq!(base.year, 2020);
        assert_eq!(base.authors, "Ada Lovelace");
    }

    #[test]
    fn comma_lists_are_trimmed() {
        let meta = PaperMetadata {
            authors: "Ada Lovelace, Alan Turing, ,".to_string(),
            journals: "Nature".to_string(),
            ..Default::default()
        };
        assert_eq!(meta.author_list(), vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(meta.journal_list(), vec!["Nature"]);
    }

    #[test]
    fn abstract_serializes_under_plain_name() {
        let meta = PaperMetadata {
            abstract_text: "x".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["abstract"], "x");
    }
}
