//! Summary text to content blocks.
//!
//! Summaries come back from the language model as lightweight Markdown where
//! every section starts with a `### ` heading line. [`split_sections`] turns
//! that text into an ordered list of [`ContentBlock`]s which the publisher
//! maps one-to-one onto page blocks.

use serde::{Deserialize, Serialize};

/// Prefix that opens a section heading.
pub const HEADING_MARKER: &str = "### ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading(String),
    Paragraph(String),
}

impl ContentBlock {
    pub fn text(&self) -> &str {
        match self {
            Self::Heading(text) | Self::Paragraph(text) => text,
        }
    }
}

/// Split a heading-delimited summary into blocks.
///
/// Blank lines before a paragraph starts are skipped; blank lines inside a
/// paragraph are kept so intentional breaks survive. Headings that are empty
/// after trimming are dropped, but still close the pending paragraph.
pub fn split_sections(summary: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in summary.lines() {
        if let Some(heading) = heading_text(line) {
            flush_paragraph(&mut pending, &mut blocks);
            if !heading.is_empty() {
                blocks.push(ContentBlock::Heading(heading.to_string()));
            }
        } else if !line.trim().is_empty() || !pending.is_empty() {
            pending.push(line);
        }
    }
    flush_paragraph(&mut pending, &mut blocks);

    blocks
}

/// Rebuild Markdown from blocks; the inverse of [`split_sections`].
///
/// Adjacent paragraphs are separated by a bare `###` line, which splits them
/// again without producing a heading.
pub fn to_markdown(blocks: &[ContentBlock]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(blocks.len());
    let mut previous_was_paragraph = false;
    for block in blocks {
        match block {
            ContentBlock::Heading(text) => {
                lines.push(format!("{HEADING_MARKER}{text}"));
                previous_was_paragraph = false;
            }
            ContentBlock::Paragraph(text) => {
                if previous_was_paragraph {
                    lines.push(HEADING_MARKER.trim_end().to_string());
                }
                lines.push(text.clone());
                previous_was_paragraph = true;
            }
        }
    }
    lines.join("\n")
}

/// Heading label of `line`, or `None` when the line is not a heading.
fn heading_text(line: &str) -> Option<&str> {
    let stripped = line.trim();
    if stripped == HEADING_MARKER.trim_end() {
        return Some("");
    }
    stripped.strip_prefix(HEADING_MARKER).map(str::trim)
}

fn flush_paragraph(pending: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    if pending.is_empty() {
        return;
    }
    let text = pending.join("\n");
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(ContentBlock::Paragraph(text.to_string()));
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(s: &str) -> ContentBlock {
        ContentBlock::Heading(s.to_string())
    }

    fn paragraph(s: &str) -> ContentBlock {
        ContentBlock::Paragraph(s.to_string())
    }

    #[test]
    fn splits_headings_and_paragraphs() {
        let blocks = split_sections("### Background\nText one\n\n### Goal\nText two");
        assert_eq!(
            blocks,
            vec![
                heading("Background"),
                paragraph("Text one"),
                heading("Goal"),
                paragraph("Text two"),
            ]
        );
    }

    #[test]
    fn text_without_marker_is_one_paragraph() {
        let blocks = split_sections("\n  First line\nsecond line  \n\n");
        assert_eq!(blocks, vec![paragraph("First line\nsecond line")]);
    }

    #[test]
    fn empty_heading_is_dropped_but_flushes_paragraph() {
        let blocks = split_sections("Intro text\n###   \nMore text");
        assert_eq!(blocks, vec![paragraph("Intro text"), paragraph("More text")]);

        let blocks = split_sections("Intro text\n### \nMore text");
        assert_eq!(blocks, vec![paragraph("Intro text"), paragraph("More text")]);
    }

    #[test]
    fn blank_lines_inside_paragraph_are_kept() {
        let blocks = split_sections("### Results\nFirst\n\nSecond\n\n\n### End");
        assert_eq!(
            blocks,
            vec![heading("Results"), paragraph("First\n\nSecond"), heading("End")]
        );
    }

    #[test]
    fn indented_heading_is_recognized() {
        let blocks = split_sections("   ###   Method  \nbody");
        assert_eq!(blocks, vec![heading("Method"), paragraph("body")]);
    }

    #[test]
    fn deeper_or_shallower_headings_are_plain_text() {
        let blocks = split_sections("## Title\n#### Sub");
        assert_eq!(blocks, vec![paragraph("## Title\n#### Sub")]);
    }

    #[test]
    fn empty_input_produces_nothing() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("\n\n   \n").is_empty());
    }

    #[test]
    fn reapplying_to_rebuilt_markdown_is_stable() {
        let inputs = [
            "Preamble\n### Background\nLine a\n\nLine b\n### \n### Goal\n  Aim  \n",
            "Intro text\n### \nMore text",
            "### A\none\n###\ntwo\n### \nthree",
        ];
        for input in inputs {
            let first = split_sections(input);
            let second = split_sections(&to_markdown(&first));
            assert_eq!(first, second, "{input:?}");
        }
    }

    #[test]
    fn adjacent_paragraphs_get_a_bare_separator() {
        let blocks = vec![paragraph("Intro text"), paragraph("More text"), heading("End")];
        assert_eq!(to_markdown(&blocks), "Intro text\n###\nMore text\n### End");
    }
}
