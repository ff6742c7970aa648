//! Merge language-model metadata with the registry's canonical record.
//!
//! The registry wins wholesale once the titles agree closely enough, with one
//! exception: an empty canonical abstract never erases an extracted one.

use paper2notion_core::PaperMetadata;
use serde::Serialize;
use tracing::info;

use crate::enrichment::similarity::{SIMILARITY_THRESHOLD, title_similarity};
use crate::identifiers::PaperIdentifier;
use crate::sources::Registry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReconcileDecision {
    /// No registry record to compare against.
    NoCandidate,
    /// Registry record found but its title was too far from the extracted one.
    Rejected { score: f64 },
    /// Registry record adopted.
    Adopted { score: f64, kept_extracted_abstract: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub metadata: PaperMetadata,
    pub decision: ReconcileDecision,
}

/// Decide between the extracted record and an optional canonical one.
pub fn reconcile(extracted: PaperMetadata, canonical: Option<PaperMetadata>) -> Reconciliation {
    let Some(canonical) = canonical else {
        return Reconciliation {
            metadata: extracted,
            decision: ReconcileDecision::NoCandidate,
        };
    };

    let score = title_similarity(&extracted.title, &canonical.title);
    if score < SIMILARITY_THRESHOLD {
        return Reconciliation {
            metadata: extracted,
            decision: ReconcileDecision::Rejected { score },
        };
    }

    let keep_abstract = canonical.abstract_text.is_empty() && !extracted.abstract_text.is_empty();
    let mut metadata = canonical;
    if keep_abstract {
        metadata.abstract_text = extracted.abstract_text;
    }

    Reconciliation {
        metadata,
        decision: ReconcileDecision::Adopted {
            score,
            kept_extracted_abstract: keep_abstract,
        },
    }
}

/// Search the registry by the extracted title and reconcile with the hit.
pub async fn reconcile_with_registry(
    registry: &dyn Registry,
    extracted: PaperMetadata,
) -> Reconciliation {
    if extracted.title.trim().is_empty() {
        return reconcile(extracted, None);
    }

    let canonical = match registry.search_doi_by_title(&extracted.title).await {
        Some(doi) => registry.fetch_metadata(&PaperIdentifier::Doi(doi)).await,
        None => None,
    };

    let outcome = reconcile(extracted, canonical);
    info!(decision = ?outcome.decision, "metadata reconciled");
    outcome
}
