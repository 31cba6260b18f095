//! File system helpers.
//!
//! This module provides:
//! - Filename sanitization and deterministic output naming
//! - Output/temp directory handling

pub mod naming;
pub mod paths;

pub use naming::{output_file_name, sanitize_filename};
pub use paths::{ensure_dir, run_temp_dir};
