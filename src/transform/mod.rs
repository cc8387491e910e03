//! Rewrites applied to encoded models.

mod compact;

pub use compact::{compact_model, compact_tree_model, CompactionError};
