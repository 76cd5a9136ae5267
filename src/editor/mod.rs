//! Editor module for Quire
//!
//! This module contains the mutation engine: primitive ops, transactions,
//! normalization, the composable transforms built on them, host-level
//! commands, undo history and the [`Editor`] session that ties them together.

mod commands;
mod history;
mod normalize;
mod ops;
mod session;
mod stats;
mod transaction;
pub mod transforms;

pub use commands::{
    block_type_at, formatting_state, is_image_url, is_mark_active, marks_at, BlockType,
    FormattingState, Payload,
};
pub use history::{Entry, History, DEFAULT_HISTORY_LIMIT};
pub use normalize::normalize_document;
pub use ops::Op;
pub use session::Editor;
pub use stats::{DocumentStats, DEFAULT_WORDS_PER_MINUTE};
pub use transaction::{PointRef, Transaction};
pub use transforms::{At, Mode};
