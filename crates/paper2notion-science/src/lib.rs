//! paper2notion science — identifiers, CrossRef, arXiv, metadata reconciliation.

pub mod arxiv;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod sources;

pub use enrichment::{Reconciliation, ReconcileDecision, SIMILARITY_THRESHOLD, reconcile, reconcile_with_registry, title_similarity};
pub use error::{Result, ScienceError};
pub use identifiers::PaperIdentifier;
pub use sources::{Registry, ScholarlyRegistry};
