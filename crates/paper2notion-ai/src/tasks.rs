//! The three paper tasks: metadata extraction, abstract translation, summary.

use paper2notion_core::{HEADING_MARKER, PaperMetadata};
use serde_json::{Value, json};

use crate::backend::{Document, GenerateRequest, LanguageModel};
use crate::error::Result;

/// Section headings requested from the summarizer, in order.
pub const SUMMARY_SECTIONS: [&str; 6] = [
    "Background",
    "Purpose",
    "Implementation / Experimental Method (Proposal)",
    "Results",
    "Conclusion",
    "Discussion",
];

fn metadata_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "authors": { "type": "STRING", "description": "Comma-separated list of \"Given Family\" names" },
            "journals": { "type": "STRING" },
            "year": { "type": "INTEGER" },
            "abstract": { "type": "STRING" }
        },
        "propertyOrdering": ["title", "authors", "journals", "year", "abstract"]
    })
}

/// Ask the model for title, authors, journal, year and abstract of `pdf`.
pub async fn extract_metadata(model: &dyn LanguageModel, pdf: &Document) -> Result<PaperMetadata> {
    let prompt = "Extract the following information from this paper PDF and answer in JSON: \
                  'title', 'authors', 'journals', 'year', 'abstract'. \
                  Use an empty string (or 0 for year) for anything you cannot find."
        .to_string();

    let text = model
        .generate(GenerateRequest {
            prompt,
            document: Some(pdf),
            response_schema: Some(metadata_schema()),
        })
        .await?;

    let mut metadata: PaperMetadata = serde_json::from_str(strip_code_fence(&text))?;
    // Identifiers only come from the registry.
    metadata.doi.clear();
    Ok(metadata)
}

/// Translate `abstract_text` into `language`; text already in it comes back as is.
pub async fn translate_abstract(
    model: &dyn LanguageModel,
    abstract_text: &str,
    language: &str,
) -> Result<String> {
    let prompt = format!(
        "If the following abstract is not written in {language}, translate it into {language}.\n\
         If it is already written in {language}, output it unchanged.\n\
         Output only the abstract text.\n\n{abstract_text}"
    );

    let text = model
        .generate(GenerateRequest {
            prompt,
            ..Default::default()
        })
        .await?;
    Ok(text.trim().to_string())
}

/// Produce a sectioned summary of `pdf`, one `### ` heading per section.
pub async fn summarize(model: &dyn LanguageModel, pdf: &Document, language: &str) -> Result<String> {
    let mut prompt = format!(
        "Based on the attached paper PDF, output only the following content, written in {language}.\n\
         Start every section with a line of the form '{HEADING_MARKER}<heading>' and put its summary below it.\n"
    );
    for section in SUMMARY_SECTIONS {
        prompt.push_str(&format!("{HEADING_MARKER}{section}\nA summary of the {section}.\n"));
    }

    let text = model
        .generate(GenerateRequest {
            prompt,
            document: Some(pdf),
            response_schema: None,
        })
        .await?;
    Ok(strip_code_fence(&text).to_string())
}

/// Remove a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `markdown`, ...) on the opening line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}
