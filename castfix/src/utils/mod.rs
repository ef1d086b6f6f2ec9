//! Utilities module for castfix.
//!
//! Path handling and source file discovery shared by the commands.

mod paths;

pub use paths::{collect_cpp_files, is_excluded, normalize_display_path, validate_output_path};
