//! Edit log shared by the rewrite engine.
//!
//! Plans for every cast site of a translation unit are recorded here as
//! byte-range edits against the original text and applied once at the end.

mod rewriter;

pub use rewriter::{Edit, EditLog, RewriteError};
