//! paper2notion publish — PDF storage backends and the Notion page publisher.

pub mod error;
pub mod notion;
pub mod storage;

pub use error::{PublishError, Result};
pub use notion::{NotionClient, PageRequest, PublishReceipt, Publisher, build_page};
pub use storage::{DropboxAuth, DropboxClient, DropboxStorage, FileReference, FileStorage, NotionFileStorage};
