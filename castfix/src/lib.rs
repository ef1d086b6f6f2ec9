//! Core library for the castfix rewriting tool.
//!
//! This library rewrites C-style casts in C++ sources into named casts:
//! `const_cast` when the cast only removes `const` through matching pointer or
//! reference levels, `static_cast` otherwise. It includes the tree-sitter
//! front end, the cast classifier, the rewrite planner and the edit log.

#![allow(
    clippy::similar_names,
    clippy::format_push_string,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module defining the type model used by the classifier.
/// This includes the `TypeModel` trait and the concrete `CType` representation.
pub mod types;

/// Module containing the cast classifier.
pub mod classify;

/// Module turning a classified cast site into edits.
pub mod plan;

/// Module containing the edit log that applies byte-range edits to a buffer.
pub mod fix;

/// Module for Tree-sitter based parsing, declaration indexing and cast-site discovery.
pub mod cst;

/// Module rewriting one translation unit end to end.
pub mod engine;

/// Module for loading configuration.
pub mod config;

/// Module containing shared constants.
pub mod constants;

/// Module containing utility functions.
/// This includes path helpers and source file discovery.
pub mod utils;

/// Module defining the entry point logic.
pub mod entry_point;

/// Module for rich CLI output formatting with colored text and progress bars.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;
