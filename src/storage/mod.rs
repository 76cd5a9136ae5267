//! Persistence of the editing session
//!
//! - `store.rs` - Key-value `Store` trait with file and in-memory backends
//! - `document.rs` - Fixed-key layout of the document, metadata and save time

mod document;
mod store;

pub use document::{
    now_millis, DocumentStorage, PersistedState, SaveStatus, DOCUMENT_KEY, LAST_SAVED_KEY,
    METADATA_KEY,
};
pub use store::{FileStore, MemoryStore, Store};
