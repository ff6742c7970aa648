use std::path::Path;

use anyhow::{Context, Result};
use paper2notion_ai::backend::INLINE_DOCUMENT_LIMIT;
use tracing::{debug, warn};

/// PDF read from disk. A parse failure is kept as the reason, not raised.
#[derive(Debug)]
pub struct PdfInput {
    pub name: String,
    pub bytes: Vec<u8>,
    pub page_count: std::result::Result<usize, String>,
}

pub fn read_pdf(path: &Path) -> Result<PdfInput> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read PDF {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "paper.pdf".to_string());

    if bytes.len() > INLINE_DOCUMENT_LIMIT {
        warn!(size = bytes.len(), limit = INLINE_DOCUMENT_LIMIT, "PDF exceeds the inline model limit");
    }

    let page_count = lopdf::Document::load_mem(&bytes)
        .map(|doc| doc.get_pages().len())
        .map_err(|err| err.to_string());
    debug!(%name, size = bytes.len(), pages = ?page_count, "pdf loaded");

    Ok(PdfInput {
        name,
        bytes,
        page_count,
    })
}
