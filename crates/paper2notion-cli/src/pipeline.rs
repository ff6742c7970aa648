//! One paper, start to finish: a `Session` carried through ordered stages.
//!
//! Every stage except publishing degrades to a warning in the report and
//! lets the next stage run.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use paper2notion_ai::{Document, LanguageModel, extract_metadata, summarize, translate_abstract};
use paper2notion_core::config::NotionPropertyNames;
use paper2notion_core::{ContentBlock, PaperMetadata, split_sections};
use paper2notion_publish::{FileReference, FileStorage, PageRequest, Publisher, build_page};
use paper2notion_science::{PaperIdentifier, ReconcileDecision, Registry, reconcile_with_registry};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pdf::PdfInput;

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutcome>,
}

impl PipelineReport {
    fn add_step(&mut self, step: impl Into<String>) {
        let step = step.into();
        info!("{step}");
        self.steps.push(step);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published { page_id: String, url: String },
    Skipped { reason: String },
    Failed { message: String },
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Everything known about the paper being processed.
///
/// Saved to disk without the PDF bytes so a failed publish can be retried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub pdf_name: String,
    #[serde(skip)]
    pub pdf: Option<Document>,
    pub identifier: Option<PaperIdentifier>,
    /// The metadata came from an identifier lookup rather than title search.
    pub identifier_resolved: bool,
    pub metadata: PaperMetadata,
    pub summary: String,
    pub file: Option<FileReference>,
    pub report: PipelineReport,
    #[serde(skip)]
    pub preview: Option<PageRequest>,
}

impl Session {
    pub fn new(pdf: PdfInput, identifier: Option<PaperIdentifier>) -> Self {
        let mut session = Self {
            pdf_name: pdf.name,
            identifier,
            ..Default::default()
        };
        match pdf.page_count {
            Ok(pages) => session.report.add_step(format!("read {} ({pages} pages)", session.pdf_name)),
            Err(reason) => session
                .report
                .add_warning(format!("{} does not parse as PDF: {reason}", session.pdf_name)),
        }
        session.pdf = Some(Document::pdf(pdf.bytes));
        session
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&data).with_context(|| format!("parsing session {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("writing session {}", path.display()))
    }

    pub fn blocks(&self) -> Vec<ContentBlock> {
        split_sections(&self.summary)
    }

    pub fn publish_failed(&self) -> bool {
        matches!(self.report.publish, Some(PublishOutcome::Failed { .. }))
    }

    pub fn already_published(&self) -> bool {
        matches!(self.report.publish, Some(PublishOutcome::Published { .. }))
    }
}

// ─── Stages ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, session: &mut Session) -> Result<()>;
}

#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn stage(mut self, stage: impl Stage + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub async fn run(&self, session: &mut Session) -> Result<()> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), "stage start");
            stage.run(session).await?;
        }
        Ok(())
    }
}

/// Fetch the registry record for an operator-supplied identifier.
pub struct LookupStage<'a> {
    pub registry: &'a dyn Registry,
}

#[async_trait]
impl Stage for LookupStage<'_> {
    fn name(&self) -> &'static str {
        "lookup"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let Some(id) = session.identifier.clone() else {
            return Ok(());
        };
        if id.is_blank() {
            session.identifier = None;
            session.report.add_warning("blank identifier ignored");
            return Ok(());
        }
        // A record without a title cannot stand in for the paper.
        let record = self
            .registry
            .fetch_metadata(&id)
            .await
            .filter(|record| !record.is_empty() && !record.title.trim().is_empty());
        match record {
            Some(record) => {
                session.metadata = record;
                session.identifier_resolved = true;
                session.report.add_step(format!("fetched registry record for {id}"));
            }
            None => session
                .report
                .add_warning(format!("no registry record for {id}; falling back to title search")),
        }
        Ok(())
    }
}

/// Extract metadata from the PDF, then either fill the gaps of a registry
/// record or reconcile against a title search.
pub struct ExtractStage<'a> {
    pub model: &'a dyn LanguageModel,
    pub registry: &'a dyn Registry,
}

#[async_trait]
impl Stage for ExtractStage<'_> {
    fn name(&self) -> &'static str {
        "extract"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        if session.identifier_resolved && session.metadata.missing_fields().is_empty() {
            session.report.add_step("registry record is complete; extraction skipped");
            return Ok(());
        }
        let Some(pdf) = session.pdf.as_ref() else {
            session.report.add_warning("no PDF in session; extraction skipped");
            return Ok(());
        };

        let extracted = match extract_metadata(self.model, pdf).await {
            Ok(extracted) => extracted,
            Err(err) => {
                session.report.add_warning(format!("metadata extraction failed: {err}"));
                return Ok(());
            }
        };

        if session.identifier_resolved {
            let filled = session.metadata.fill_missing_from(&extracted);
            session
                .report
                .add_step(format!("filled from PDF: {}", filled.join(", ")));
            return Ok(());
        }

        let outcome = reconcile_with_registry(self.registry, extracted).await;
        session.report.add_step(match outcome.decision {
            ReconcileDecision::NoCandidate => "no registry match; keeping extracted metadata".to_string(),
            ReconcileDecision::Rejected { score } => {
                format!("registry match rejected (similarity {score:.2}); keeping extracted metadata")
            }
            ReconcileDecision::Adopted { score, .. } => {
                format!("adopted registry record (similarity {score:.2})")
            }
        });
        session.metadata = outcome.metadata;
        Ok(())
    }
}

pub struct TranslateStage<'a> {
    pub model: &'a dyn LanguageModel,
    pub enabled: bool,
    pub language: String,
}

#[async_trait]
impl Stage for TranslateStage<'_> {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        if !self.enabled {
            session.report.add_step("translation disabled");
            return Ok(());
        }
        if session.metadata.abstract_text.trim().is_empty() {
            session.report.add_step("no abstract to translate");
            return Ok(());
        }

        match translate_abstract(self.model, &session.metadata.abstract_text, &self.language).await {
            Ok(text) if !text.is_empty() => {
                session.metadata.abstract_text = text;
                session
                    .report
                    .add_step(format!("abstract translated to {}", self.language));
            }
            Ok(_) => session
                .report
                .add_warning("translation came back empty; original abstract kept"),
            Err(err) => session
                .report
                .add_warning(format!("abstract translation failed: {err}")),
        }
        Ok(())
    }
}

pub struct SummarizeStage<'a> {
    pub model: &'a dyn LanguageModel,
    pub language: String,
}

#[async_trait]
impl Stage for SummarizeStage<'_> {
    fn name(&self) -> &'static str {
        "summarize"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let Some(pdf) = session.pdf.as_ref() else {
            session.report.add_warning("no PDF in session; summary skipped");
            return Ok(());
        };
        match summarize(self.model, pdf, &self.language).await {
            Ok(summary) => {
                session.summary = summary;
                let sections = session
                    .blocks()
                    .iter()
                    .filter(|block| matches!(block, ContentBlock::Heading(_)))
                    .count();
                session
                    .report
                    .add_step(format!("summary written ({sections} sections)"));
            }
            Err(err) => {
                session.summary.clear();
                session.report.add_warning(format!("summary failed: {err}"));
            }
        }
        Ok(())
    }
}

pub struct UploadStage<'a> {
    pub storage: Option<&'a dyn FileStorage>,
}

#[async_trait]
impl Stage for UploadStage<'_> {
    fn name(&self) -> &'static str {
        "upload"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        let Some(storage) = self.storage else {
            session.report.add_step("PDF storage disabled");
            return Ok(());
        };
        let Some(pdf) = session.pdf.as_ref() else {
            session.report.add_warning("no PDF in session; upload skipped");
            return Ok(());
        };

        match storage.store(&session.pdf_name, &pdf.bytes).await {
            Ok(reference) => {
                session
                    .report
                    .add_step(format!("stored {} with {}", reference.name(), storage.name()));
                session.file = Some(reference);
            }
            Err(err) => session.report.add_warning(format!(
                "{} upload failed, page will have no file link: {err}",
                storage.name()
            )),
        }
        Ok(())
    }
}

/// Build the page and hand it to the publisher. Without a publisher the page
/// is only assembled (dry run).
pub struct PublishStage<'a> {
    pub publisher: Option<&'a dyn Publisher>,
    pub database_id: String,
    pub properties: NotionPropertyNames,
}

#[async_trait]
impl Stage for PublishStage<'_> {
    fn name(&self) -> &'static str {
        "publish"
    }

    async fn run(&self, session: &mut Session) -> Result<()> {
        if session.metadata.is_empty() && session.summary.trim().is_empty() {
            session.report.add_warning("no metadata and no summary; nothing to publish");
            session.report.publish = Some(PublishOutcome::Skipped {
                reason: "nothing to publish".to_string(),
            });
            return Ok(());
        }

        let page = build_page(
            &self.database_id,
            &self.properties,
            &session.metadata,
            &session.blocks(),
            session.file.as_ref(),
        );

        let Some(publisher) = self.publisher else {
            session.report.add_step(format!("dry run: page with {} blocks assembled", page.children.len()));
            session.report.publish = Some(PublishOutcome::Skipped {
                reason: "dry run".to_string(),
            });
            session.preview = Some(page);
            return Ok(());
        };

        match publisher.publish(&page).await {
            Ok(receipt) => {
                session.report.add_step(format!("published page {}", receipt.page_id));
                session.report.publish = Some(PublishOutcome::Published {
                    page_id: receipt.page_id,
                    url: receipt.url,
                });
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                session.report.publish = Some(PublishOutcome::Failed {
                    message: message.clone(),
                });
                bail!("publishing failed: {message}")
            }
        }
    }
}
