//! Path and directory management.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Allocate a per-run temporary directory path under `temp_root`.
///
/// The uuid namespace keeps concurrently running pipelines that share the
/// temp root from ever touching each other's artifacts. The directory is
/// not created here; the pipeline creates and removes it.
pub fn run_temp_dir(temp_root: &Path) -> PathBuf {
    temp_root.join(format!("stitch_{}", Uuid::new_v4()))
}
