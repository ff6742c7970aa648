//! Page payload assembly: database properties plus content blocks.

use paper2notion_core::config::NotionPropertyNames;
use paper2notion_core::{ContentBlock, PaperMetadata};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::storage::FileReference;

/// Longest text Notion accepts in a single rich text object.
pub const RICH_TEXT_LIMIT: usize = 2000;

pub const UNTITLED: &str = "No Title";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRequest {
    pub parent: Value,
    pub properties: Map<String, Value>,
    pub children: Vec<Value>,
}

/// Rich text array for `text`, split into segments of at most
/// [`RICH_TEXT_LIMIT`] characters.
pub fn rich_text(text: &str) -> Value {
    let chars: Vec<char> = text.chars().collect();
    let segments: Vec<Value> = chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect();
    Value::Array(segments)
}

fn multi_select(names: Vec<String>) -> Value {
    let options: Vec<Value> = names.into_iter().map(|name| json!({ "name": name })).collect();
    json!({ "multi_select": options })
}

fn file_object(file: &FileReference) -> Value {
    match file {
        FileReference::External { url, .. } => json!({ "type": "external", "external": { "url": url } }),
        FileReference::Uploaded { id, .. } => {
            json!({ "type": "file_upload", "file_upload": { "id": id } })
        }
    }
}

fn file_block(file: &FileReference) -> Value {
    let mut body = file_object(file);
    body["caption"] = rich_text(&format!("Uploaded PDF: {}", file.name()));
    json!({ "object": "block", "type": "file", "file": body })
}

fn content_block(block: &ContentBlock) -> Value {
    let kind = match block {
        ContentBlock::Heading(_) => "heading_3",
        ContentBlock::Paragraph(_) => "paragraph",
    };
    let mut value = json!({ "object": "block", "type": kind });
    value[kind] = json!({ "rich_text": rich_text(block.text()) });
    value
}

pub fn build_page(
    database_id: &str,
    names: &NotionPropertyNames,
    metadata: &PaperMetadata,
    blocks: &[ContentBlock],
    file: Option<&FileReference>,
) -> PageRequest {
    let title = if metadata.title.trim().is_empty() {
        UNTITLED
    } else {
        metadata.title.as_str()
    };

    let mut properties = Map::new();
    properties.insert(names.title.clone(), json!({ "title": rich_text(title) }));
    properties.insert(names.authors.clone(), multi_select(metadata.author_list()));
    properties.insert(names.journal.clone(), multi_select(metadata.journal_list()));
    properties.insert(names.year.clone(), json!({ "number": metadata.known_year() }));
    let doi = (!metadata.doi.is_empty()).then_some(metadata.doi.as_str());
    properties.insert(names.doi.clone(), json!({ "url": doi }));
    properties.insert(
        names.abstract_text.clone(),
        json!({ "rich_text": rich_text(&metadata.abstract_text) }),
    );

    let mut children = Vec::with_capacity(blocks.len() + 1);
    if let Some(file) = file {
        let mut entry = file_object(file);
        entry["name"] = json!(file.name());
        properties.insert(names.pdf.clone(), json!({ "files": [entry] }));
        children.push(file_block(file));
    }
    children.extend(blocks.iter().map(content_block));

    PageRequest {
        parent: json!({ "database_id": database_id }),
        properties,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> NotionPropertyNames {
        NotionPropertyNames::default()
    }

    fn metadata() -> PaperMetadata {
        PaperMetadata {
            title: "Deep learning".to_string(),
            authors: "Yann LeCun, Yoshua Bengio, Geoffrey Hinton".to_string(),
            journals: "Nature".to_string(),
            year: 2015,
            doi: "https://doi.org/10.1038/nature14539".to_string(),
            abstract_text: "Deep learning allows...".to_string(),
        }
    }

    #[test]
    fn properties_follow_metadata() {
        let page = build_page("db", &names(), &metadata(), &[], None);
        let props = &page.properties;

        assert_eq!(page.parent, json!({"database_id": "db"}));
        assert_eq!(props["Title"]["title"][0]["text"]["content"], "Deep learning");
        assert_eq!(props["Authors"]["multi_select"].as_array().unwrap().len(), 3);
        assert_eq!(props["Authors"]["multi_select"][2]["name"], "Geoffrey Hinton");
        assert_eq!(props["Journal"]["multi_select"][0]["name"], "Nature");
        assert_eq!(props["Year"]["number"], 2015);
        assert_eq!(props["DOI"]["url"], "https://doi.org/10.1038/nature14539");
        assert_eq!(props["Abstract"]["rich_text"][0]["text"]["content"], "Deep learning allows...");
        assert!(!props.contains_key("PDF"));
        assert!(page.children.is_empty());
    }

    #[test]
    fn unknown_year_and_doi_are_null() {
        let meta = PaperMetadata {
            year: 0,
            doi: String::new(),
            ..metadata()
        };
        let page = build_page("db", &names(), &meta, &[], None);
        assert_eq!(page.properties["Year"], json!({"number": null}));
        assert_eq!(page.properties["DOI"], json!({"url": null}));
    }

    #[test]
    fn empty_title_uses_placeholder() {
        let page = build_page("db", &names(), &PaperMetadata::default(), &[], None);
        assert_eq!(page.properties["Title"]["title"][0]["text"]["content"], UNTITLED);
        assert_eq!(page.properties["Authors"], json!({"multi_select": []}));
        assert_eq!(page.properties["Abstract"], json!({"rich_text": []}));
    }

    #[test]
    fn custom_property_names_are_used() {
        let names = NotionPropertyNames {
            title: "Name".to_string(),
            abstract_text: "Summary".to_string(),
            ..names()
        };
        let page = build_page("db", &names, &metadata(), &[], None);
        assert!(page.properties.contains_key("Name"));
        assert!(page.properties.contains_key("Summary"));
        assert!(!page.properties.contains_key("Title"));
    }

    #[test]
    fn blocks_map_to_heading_and_paragraph() {
        let blocks = vec![
            ContentBlock::Heading("Background".to_string()),
            ContentBlock::Paragraph("Some text".to_string()),
        ];
        let page = build_page("db", &names(), &metadata(), &blocks, None);
        assert_eq!(page.children.len(), 2);
        assert_eq!(page.children[0]["type"], "heading_3");
        assert_eq!(page.children[0]["heading_3"]["rich_text"][0]["text"]["content"], "Background");
        assert_eq!(page.children[1]["type"], "paragraph");
        assert_eq!(page.children[1]["paragraph"]["rich_text"][0]["text"]["content"], "Some text");
    }

    #[test]
    fn external_file_leads_content_and_fills_property() {
        let file = FileReference::External {
            url: "https://dl.example/p.pdf?raw=1".to_string(),
            name: "p.pdf".to_string(),
        };
        let blocks = vec![ContentBlock::Paragraph("x".to_string())];
        let page = build_page("db", &names(), &metadata(), &blocks, Some(&file));

        assert_eq!(page.children.len(), 2);
        let lead = &page.children[0];
        assert_eq!(lead["type"], "file");
        assert_eq!(lead["file"]["type"], "external");
        assert_eq!(lead["file"]["external"]["url"], "https://dl.example/p.pdf?raw=1");
        assert_eq!(lead["file"]["caption"][0]["text"]["content"], "Uploaded PDF: p.pdf");

        let entry = &page.properties["PDF"]["files"][0];
        assert_eq!(entry["name"], "p.pdf");
        assert_eq!(entry["external"]["url"], "https://dl.example/p.pdf?raw=1");
    }

    #[test]
    fn uploaded_file_references_upload_id() {
        let file = FileReference::Uploaded {
            id: "up-1".to_string(),
            name: "p.pdf".to_string(),
        };
        let page = build_page("db", &names(), &metadata(), &[], Some(&file));
        assert_eq!(page.children[0]["file"]["type"], "file_upload");
        assert_eq!(page.children[0]["file"]["file_upload"]["id"], "up-1");
        assert_eq!(page.properties["PDF"]["files"][0]["file_upload"]["id"], "up-1");
    }

    #[test]
    fn long_text_is_split_on_char_boundaries() {
        let text = "é".repeat(RICH_TEXT_LIMIT * 2 + 5);
        let segments = rich_text(&text);
        let segments = segments.as_array().unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0]["text"]["content"].as_str().unwrap().chars().count(), RICH_TEXT_LIMIT);
        assert_eq!(segments[2]["text"]["content"].as_str().unwrap().chars().count(), 5);
        assert_eq!(rich_text(""), json!([]));
    }
}
