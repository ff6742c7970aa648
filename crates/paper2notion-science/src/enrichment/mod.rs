pub mod reconcile;
pub mod similarity;

pub use reconcile::{Reconciliation, ReconcileDecision, reconcile, reconcile_with_registry};
pub use similarity::{SIMILARITY_THRESHOLD, title_similarity};
