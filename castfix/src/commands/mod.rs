//! Commands module - CLI command implementations.

mod rewrite;

pub use rewrite::{
    run_rewrite, FileFailure, FileReport, RewriteCommandOptions, RewriteMode, RewriteSummary,
};
