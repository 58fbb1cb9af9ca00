//! Shopping-list persistence and use cases.
//!
//! # File Layout
//!
//! ```text
//! {state_dir}/
//! ├── pending_items.json       ({"items": [...]}, replaced atomically)
//! └── pending_items.json.lock  (flock serializing load-modify-save)
//! ```

mod service;
mod store;

pub use service::ListService;
pub use store::RecordStore;
