//! Shared building blocks for homekeep: the shopping-list and pool-status
//! data model, the free-text item parser and the storage error taxonomy.

pub mod error;
pub mod parser;
pub mod time;
pub mod types;

pub use error::{ListError, StorageError};
pub use parser::{CONJUNCTION, ParsedItem, split_items};
pub use time::StampZone;
pub use types::{LOGGED_AT_KEY, OutputFormat, ShoppingEntry, StatusSnapshot};
