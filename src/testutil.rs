//! Test doubles shared across module tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::assemble::Concatenator;
use crate::error::{AssembleError, FetchError};
use crate::fetch::Transport;

/// In-memory transport keyed by URL, with scripted bodies, error statuses,
/// artificial latency, and transient failures.
#[derive(Default)]
pub(crate) struct FakeTransport {
    bodies: HashMap<String, Bytes>,
    statuses: HashMap<String, u16>,
    latencies: HashMap<String, Duration>,
    flaky_remaining: HashMap<String, AtomicU32>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: &str, text: &str) -> Self {
        self.bodies
            .insert(url.to_string(), Bytes::copy_from_slice(text.as_bytes()));
        self
    }

    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from(body));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    pub fn with_latency(mut self, url: &str, latency: Duration) -> Self {
        self.latencies.insert(url.to_string(), latency);
        self
    }

    /// Serve `body` at `url`, but fail the first `failures` requests with a
    /// network error.
    pub fn with_flaky_body(mut self, url: &str, body: Vec<u8>, failures: u32) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from(body));
        self.flaky_remaining
            .insert(url.to_string(), AtomicU32::new(failures));
        self
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> std::result::Result<Bytes, FetchError> {
        let key = url.as_str();

        if let Some(latency) = self.latencies.get(key) {
            tokio::time::sleep(*latency).await;
        }

        if let Some(remaining) = self.flaky_remaining.get(key) {
            let decremented = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                .is_ok();
            if decremented {
                return Err(FetchError::Network("transient failure".into()));
            }
        }

        if let Some(status) = self.statuses.get(key) {
            return Err(FetchError::Status(*status));
        }

        self.bodies
            .get(key)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}

/// Concatenator that byte-appends the files in order; stands in for ffmpeg
/// so merged content can be asserted exactly.
pub(crate) struct CatConcatenator;

#[async_trait]
impl Concatenator for CatConcatenator {
    async fn concat(
        &self,
        files: &[PathBuf],
        output: &Path,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), AssembleError> {
        let mut merged = Vec::new();
        for file in files {
            merged.extend(fs::read(file).await?);
        }
        fs::write(output, merged).await?;
        Ok(())
    }
}

/// Concatenator that always reports a tool failure.
pub(crate) struct FailingConcatenator;

#[async_trait]
impl Concatenator for FailingConcatenator {
    async fn concat(
        &self,
        _files: &[PathBuf],
        _output: &Path,
        _cancel: &CancellationToken,
    ) -> std::result::Result<(), AssembleError> {
        Err(AssembleError::ToolFailure {
            status: "exit status: 1".into(),
            stderr: "simulated tool failure".into(),
        })
    }
}
