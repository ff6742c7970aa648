pub mod paper;

pub use paper::PaperMetadata;
