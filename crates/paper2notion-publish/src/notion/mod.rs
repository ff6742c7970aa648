pub mod client;
pub mod payload;

pub use client::{FileUpload, NotionClient, PublishReceipt, Publisher};
pub use payload::{PageRequest, build_page, rich_text};
