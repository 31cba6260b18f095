//! Concurrent segment downloading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use rand::Rng;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::fetch::client::Transport;
use crate::manifest::{MediaManifest, SegmentRef};

/// A segment persisted to a temporary artifact.
#[derive(Debug, Clone)]
pub struct FetchedSegment {
    /// Original 0-based playlist index.
    pub index: usize,

    /// Path of the temporary artifact holding the segment bytes.
    pub path: PathBuf,

    /// Artifact size in bytes.
    pub bytes: u64,
}

/// A segment that could not be fetched after all retry attempts.
///
/// Failures are data, not interrupts: the fetcher collects these and keeps
/// going, so one bad segment never aborts the batch.
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    /// Original 0-based playlist index.
    pub index: usize,

    /// Final error after retries were exhausted.
    pub cause: FetchError,
}

/// Tuning knobs for [`fetch_all`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Maximum concurrent segment downloads.
    pub concurrency: usize,

    /// Fetch attempts per segment before recording a failure.
    pub max_attempts: u32,

    /// Base delay between retry attempts. Grows linearly per attempt with
    /// a random jitter on top.
    pub retry_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Download every segment of `manifest` into `temp_dir`.
///
/// Never fails as a whole: per-segment errors become `SegmentFailure`
/// entries. Fetches run concurrently, but the returned fetched sequence is
/// sorted by ascending segment index regardless of completion order — order
/// is restored at collection time, not by constraining the fetches.
pub async fn fetch_all(
    transport: &dyn Transport,
    manifest: &MediaManifest,
    temp_dir: &Path,
    options: &FetchOptions,
    cancel: &CancellationToken,
    progress: Option<&ProgressBar>,
) -> (Vec<FetchedSegment>, Vec<SegmentFailure>) {
    let results: Vec<std::result::Result<FetchedSegment, SegmentFailure>> =
        stream::iter(manifest.segments.iter())
            .map(|segment| {
                let path = segment_path(temp_dir, segment.index);
                async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(SegmentFailure {
                            index: segment.index,
                            cause: FetchError::Cancelled,
                        }),
                        result = fetch_one(transport, segment, &path, options) => result,
                    };
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    result
                }
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;

    let mut fetched = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(segment) => fetched.push(segment),
            Err(failure) => failures.push(failure),
        }
    }

    fetched.sort_by_key(|s| s.index);
    failures.sort_by_key(|f| f.index);

    (fetched, failures)
}

/// Temp artifact path for one segment inside the per-run directory.
fn segment_path(temp_dir: &Path, index: usize) -> PathBuf {
    temp_dir.join(format!("seg_{:05}.ts", index))
}

/// Fetch a single segment with bounded retries.
async fn fetch_one(
    transport: &dyn Transport,
    segment: &SegmentRef,
    path: &Path,
    options: &FetchOptions,
) -> std::result::Result<FetchedSegment, SegmentFailure> {
    let attempts = options.max_attempts.max(1);
    let mut last_error = FetchError::Network("no attempt made".into());

    for attempt in 1..=attempts {
        match try_fetch(transport, segment, path).await {
            Ok(fetched) => return Ok(fetched),
            Err(cause) => {
                tracing::debug!(
                    "segment {} attempt {}/{} failed: {}",
                    segment.index,
                    attempt,
                    attempts,
                    cause
                );
                last_error = cause;
                if attempt < attempts {
                    tokio::time::sleep(backoff_delay(options.retry_backoff, attempt)).await;
                }
            }
        }
    }

    Err(SegmentFailure {
        index: segment.index,
        cause: last_error,
    })
}

/// Linear backoff with up to 25% random jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..0.25);
    base * attempt + base.mul_f64(jitter)
}

/// Fetch segment bytes and persist them to `path`.
async fn try_fetch(
    transport: &dyn Transport,
    segment: &SegmentRef,
    path: &Path,
) -> std::result::Result<FetchedSegment, FetchError> {
    let bytes = transport.get(&segment.url).await?;

    let mut file = File::create(path)
        .await
        .map_err(|e| FetchError::Write(e.to_string()))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| FetchError::Write(e.to_string()))?;
    file.flush()
        .await
        .map_err(|e| FetchError::Write(e.to_string()))?;

    Ok(FetchedSegment {
        index: segment.index,
        path: path.to_path_buf(),
        bytes: bytes.len() as u64,
    })
}
