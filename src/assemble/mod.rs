//! Segment reassembly.
//!
//! This module provides:
//! - The `Concatenator` capability trait and its ffmpeg backend
//! - The reassembly operation with guaranteed artifact cleanup

pub mod concat;

pub use concat::{Concatenator, FfmpegConcatenator};

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio_util::sync::CancellationToken;

use crate::error::AssembleError;
use crate::fetch::FetchedSegment;

/// Concatenate fetched segments, in sequence-index order, into `output`.
///
/// An empty input fails with [`AssembleError::EmptyInput`] before anything
/// touches the filesystem. On every other path — success or tool failure —
/// all temporary segment artifacts are deleted before this returns; the
/// fetcher's ownership of them ends here.
pub async fn assemble(
    concatenator: &dyn Concatenator,
    segments: &[FetchedSegment],
    output: &Path,
    cancel: &CancellationToken,
) -> std::result::Result<(), AssembleError> {
    if segments.is_empty() {
        return Err(AssembleError::EmptyInput);
    }

    let files: Vec<PathBuf> = segments.iter().map(|s| s.path.clone()).collect();
    let result = concatenator.concat(&files, output, cancel).await;

    for file in &files {
        if let Err(e) = fs::remove_file(file).await {
            tracing::debug!("failed to remove segment artifact {}: {}", file.display(), e);
        }
    }

    result
}
