//! CST (Concrete Syntax Tree) module for C++ sources.
//!
//! This module is the host side of the rewrite engine. It provides
//! Tree-sitter based parsing and everything the engine needs from a front end:
//! - Precise byte ranges for every cast expression
//! - A declaration index that reconstructs operand and destination types
//! - Detection of casts that must not be rewritten (macro arguments,
//!   preprocessor conditions, value discards)
//!
//! # Design Principles
//!
//! - **Byte-range anchored**: sites carry byte offsets into the original text
//! - **Unknown types are general**: an operand whose type cannot be
//!   reconstructed is rewritten with `static_cast`

mod decls;
mod parser;
mod sites;

pub use decls::{descriptor_type, DeclarationIndex};
pub use parser::{CstError, CstParser, CstTree};
pub use sites::{discover_casts, Discovery, DiscoveryOptions};
