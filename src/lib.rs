//! hls-stitch — download HLS streams and stitch them into single files.
//!
//! Given a batch of manifest URLs, each URL runs through a straight
//! pipeline: resolve the manifest to a concrete media playlist, fetch every
//! segment it references, and merge the segments into one playable file via
//! a lossless stream copy.
//!
//! # Behavior
//!
//! - Master playlists are followed through one level of indirection, with a
//!   deterministic variant selection policy
//! - Segment downloads run concurrently with bounded retries; individual
//!   failures degrade the output instead of aborting
//! - One failing URL never stops the rest of the batch
//! - Temporary artifacts are cleaned up on every completion path
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//! use hls_stitch::{
//!     FfmpegConcatenator, HttpClient, ManifestRef, Pipeline, PipelineOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpClient::new(
//!         "Mozilla/5.0",
//!         std::time::Duration::from_secs(10),
//!     )?);
//!     let pipeline = Pipeline::new(
//!         transport,
//!         Arc::new(FfmpegConcatenator::default()),
//!         PipelineOptions::default(),
//!     );
//!
//!     let refs = [ManifestRef::new(Url::parse(
//!         "https://cdn.example.com/vod/playlist.m3u8",
//!     )?)];
//!     let outcomes = pipeline.run(&refs, &CancellationToken::new()).await;
//!     for outcome in &outcomes {
//!         println!("{}: done={}", outcome.url, outcome.is_done());
//!     }
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fs;
pub mod manifest;
pub mod output;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use assemble::{assemble, Concatenator, FfmpegConcatenator};
pub use config::{validate_config, Config};
pub use error::{AssembleError, Error, FetchError, ManifestError, Result};
pub use fetch::{fetch_all, FetchOptions, FetchedSegment, HttpClient, SegmentFailure, Transport};
pub use manifest::{resolve, ManifestRef, MediaManifest, SegmentRef, VariantPolicy};
pub use pipeline::{BatchStats, Pipeline, PipelineOptions, PipelineOutcome, Stage};
