//! Pipeline orchestration: resolve → fetch → assemble per URL.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::fs;
use tokio_util::sync::CancellationToken;

use crate::assemble::{self, Concatenator};
use crate::fetch::{self, FetchOptions, Transport};
use crate::fs::naming::output_file_name;
use crate::fs::paths::run_temp_dir;
use crate::manifest::{self, ManifestRef, VariantPolicy};
use crate::output::progress::create_segment_bar;
use crate::pipeline::outcome::{PipelineOutcome, Stage, StageFailure};

/// Options governing one orchestrator instance.
///
/// Everything the pipeline needs is passed in here explicitly; there is no
/// process-wide configuration state.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory receiving one merged output file per successful URL.
    pub output_dir: PathBuf,

    /// Root for per-run temporary segment directories.
    pub temp_dir: PathBuf,

    /// Bounded worker pool size for the batch loop over URLs.
    pub worker_count: usize,

    /// Segment fetch tuning (concurrency, retries, backoff).
    pub fetch: FetchOptions,

    /// Variant selection policy for master playlists.
    pub variant_policy: VariantPolicy,

    /// Show a per-URL segment progress bar.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            temp_dir: std::env::temp_dir(),
            worker_count: 4,
            fetch: FetchOptions::default(),
            variant_policy: VariantPolicy::default(),
            show_progress: false,
        }
    }
}

/// Composes the resolver, fetcher, and reassembler into one operation per
/// input URL.
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    concatenator: Arc<dyn Concatenator>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        concatenator: Arc<dyn Concatenator>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transport,
            concatenator,
            options,
        }
    }

    /// Run the batch. Returns one outcome per input, in input order; a
    /// failure in one URL's pipeline never aborts the others.
    ///
    /// URLs run on a bounded worker pool. `buffered` (not
    /// `buffer_unordered`) keeps outcome order aligned with input order.
    pub async fn run(
        &self,
        refs: &[ManifestRef],
        cancel: &CancellationToken,
    ) -> Vec<PipelineOutcome> {
        stream::iter(refs)
            .map(|manifest_ref| self.run_one(manifest_ref, cancel))
            .buffered(self.options.worker_count.max(1))
            .collect()
            .await
    }

    /// Run the full pipeline for a single URL.
    pub async fn run_one(
        &self,
        manifest_ref: &ManifestRef,
        cancel: &CancellationToken,
    ) -> PipelineOutcome {
        let url = manifest_ref.url.to_string();
        tracing::info!("processing {}", url);

        // Resolving; a fired token stops the stage without waiting out the
        // manifest request.
        let resolved = tokio::select! {
            _ = cancel.cancelled() => {
                return self.failed(manifest_ref, 0, 0, Stage::Resolving, "cancelled".to_string());
            }
            resolved = manifest::resolve(
                self.transport.as_ref(),
                &manifest_ref.url,
                self.options.variant_policy,
            ) => resolved,
        };
        let media_manifest = match resolved {
            Ok(m) => m,
            Err(e) => {
                return self.failed(manifest_ref, 0, 0, Stage::Resolving, e.to_string());
            }
        };
        let attempted = media_manifest.segment_count();
        tracing::info!("{}: {} segment(s)", url, attempted);

        // Per-URL namespaced temp dir keeps concurrent pipelines apart.
        let temp_dir = run_temp_dir(&self.options.temp_dir);
        if let Err(e) = fs::create_dir_all(&temp_dir).await {
            return self.failed(manifest_ref, attempted, 0, Stage::Fetching, e.to_string());
        }

        // Fetching; per-segment failures are collected, never raised.
        let progress = self
            .options
            .show_progress
            .then(|| create_segment_bar(attempted as u64));
        let (fetched, failures) = fetch::fetch_all(
            self.transport.as_ref(),
            &media_manifest,
            &temp_dir,
            &self.options.fetch,
            cancel,
            progress.as_ref(),
        )
        .await;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        if cancel.is_cancelled() {
            // Cancellation still honors the cleanup contract for whatever
            // was already written.
            let _ = fs::remove_dir_all(&temp_dir).await;
            return self.failed(
                manifest_ref,
                attempted,
                failures.len(),
                Stage::Fetching,
                "cancelled".to_string(),
            );
        }

        if !failures.is_empty() {
            tracing::warn!(
                "{}: {} of {} segment(s) failed, attempting partial reconstruction",
                url,
                failures.len(),
                attempted
            );
        }

        // Assembling; segment artifacts are deleted on every exit path.
        let output_path = self.options.output_dir.join(output_file_name(manifest_ref));
        let result =
            assemble::assemble(self.concatenator.as_ref(), &fetched, &output_path, cancel).await;
        let _ = fs::remove_dir_all(&temp_dir).await;

        match result {
            Ok(()) => PipelineOutcome {
                url,
                label: manifest_ref.label.clone(),
                output: Some(output_path),
                segments_attempted: attempted,
                segments_failed: failures.len(),
                failure: None,
            },
            Err(e) => self.failed(
                manifest_ref,
                attempted,
                failures.len(),
                Stage::Assembling,
                e.to_string(),
            ),
        }
    }

    fn failed(
        &self,
        manifest_ref: &ManifestRef,
        attempted: usize,
        seg_failures: usize,
        stage: Stage,
        cause: String,
    ) -> PipelineOutcome {
        tracing::warn!("{}: failed while {}: {}", manifest_ref.url, stage, cause);
        PipelineOutcome {
            url: manifest_ref.url.to_string(),
            label: manifest_ref.label.clone(),
            output: None,
            segments_attempted: attempted,
            segments_failed: seg_failures,
            failure: Some(StageFailure { stage, cause }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CatConcatenator, FakeTransport};
    use url::Url;

    const MEDIA_3: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXTINF:9.0,\n\
seg0.ts\n\
#EXTINF:9.0,\n\
seg1.ts\n\
#EXTINF:9.0,\n\
seg2.ts\n\
#EXT-X-ENDLIST\n";

    const MEDIA_5: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXTINF:9.0,\n\
seg0.ts\n\
#EXTINF:9.0,\n\
seg1.ts\n\
#EXTINF:9.0,\n\
seg2.ts\n\
#EXTINF:9.0,\n\
seg3.ts\n\
#EXTINF:9.0,\n\
seg4.ts\n\
#EXT-X-ENDLIST\n";

    const MASTER_2: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=250000\n\
low/media.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=1500000\n\
high/media.m3u8\n";

    const EMPTY_MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:10\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXT-X-ENDLIST\n";

    struct Fixture {
        pipeline: Pipeline,
        _output: tempfile::TempDir,
        _temp: tempfile::TempDir,
    }

    fn fixture(transport: FakeTransport) -> Fixture {
        let output = tempfile::tempdir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let options = PipelineOptions {
            output_dir: output.path().to_path_buf(),
            temp_dir: temp.path().to_path_buf(),
            worker_count: 2,
            fetch: FetchOptions {
                concurrency: 4,
                max_attempts: 1,
                retry_backoff: std::time::Duration::from_millis(1),
            },
            variant_policy: VariantPolicy::FirstListed,
            show_progress: false,
        };
        Fixture {
            pipeline: Pipeline::new(Arc::new(transport), Arc::new(CatConcatenator), options),
            _output: output,
            _temp: temp,
        }
    }

    fn manifest_ref(url: &str) -> ManifestRef {
        ManifestRef::new(Url::parse(url).unwrap())
    }

    fn temp_dir_is_empty(fixture: &Fixture) -> bool {
        std::fs::read_dir(fixture._temp.path()).unwrap().count() == 0
    }

    // Scenario A: media manifest with 3 segments, all succeed.
    #[tokio::test]
    async fn all_segments_succeed() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_body("https://cdn.example.com/vod/seg0.ts", b"AAA".to_vec())
            .with_body("https://cdn.example.com/vod/seg1.ts", b"BBB".to_vec())
            .with_body("https://cdn.example.com/vod/seg2.ts", b"CCC".to_vec());
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[manifest_ref("https://cdn.example.com/vod/media.m3u8")],
                &cancel,
            )
            .await;

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert!(outcome.is_done());
        assert_eq!(outcome.segments_attempted, 3);
        assert_eq!(outcome.segments_failed, 0);
        let output = outcome.output.as_ref().unwrap();
        assert_eq!(std::fs::read(output).unwrap(), b"AAABBBCCC");
        assert!(temp_dir_is_empty(&f));
    }

    // Scenario B: master manifest, first variant has 5 segments, #3 404s.
    // Partial reconstruction still succeeds and reports the loss.
    #[tokio::test]
    async fn partial_reconstruction_on_missing_segment() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/master.m3u8", MASTER_2)
            .with_text("https://cdn.example.com/vod/low/media.m3u8", MEDIA_5)
            .with_body("https://cdn.example.com/vod/low/seg0.ts", b"S0".to_vec())
            .with_body("https://cdn.example.com/vod/low/seg1.ts", b"S1".to_vec())
            .with_status("https://cdn.example.com/vod/low/seg2.ts", 404)
            .with_body("https://cdn.example.com/vod/low/seg3.ts", b"S3".to_vec())
            .with_body("https://cdn.example.com/vod/low/seg4.ts", b"S4".to_vec());
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[manifest_ref("https://cdn.example.com/vod/master.m3u8")],
                &cancel,
            )
            .await;

        let outcome = &outcomes[0];
        assert!(outcome.is_done());
        assert!(outcome.is_partial());
        assert_eq!(outcome.segments_attempted, 5);
        assert_eq!(outcome.segments_failed, 1);
        let merged = std::fs::read(outcome.output.as_ref().unwrap()).unwrap();
        assert_eq!(merged, b"S0S1S3S4");
        assert!(temp_dir_is_empty(&f));
    }

    // Scenario C: manifest URL returns 403.
    #[tokio::test]
    async fn unreachable_manifest_fails_at_resolving() {
        let transport =
            FakeTransport::new().with_status("https://cdn.example.com/vod/media.m3u8", 403);
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[manifest_ref("https://cdn.example.com/vod/media.m3u8")],
                &cancel,
            )
            .await;

        let outcome = &outcomes[0];
        assert!(!outcome.is_done());
        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Resolving);
        assert!(failure.cause.contains("unreachable"));
        assert!(outcome.output.is_none());
    }

    // Scenario D: media manifest with zero segments.
    #[tokio::test]
    async fn empty_manifest_fails_at_resolving() {
        let transport =
            FakeTransport::new().with_text("https://cdn.example.com/vod/media.m3u8", EMPTY_MEDIA);
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[manifest_ref("https://cdn.example.com/vod/media.m3u8")],
                &cancel,
            )
            .await;

        let failure = outcomes[0].failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Resolving);
        assert!(failure.cause.contains("no segments"));
    }

    #[tokio::test]
    async fn one_failed_url_does_not_abort_the_batch() {
        let transport = FakeTransport::new()
            .with_status("https://cdn.example.com/bad/media.m3u8", 403)
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_body("https://cdn.example.com/vod/seg0.ts", b"AAA".to_vec())
            .with_body("https://cdn.example.com/vod/seg1.ts", b"BBB".to_vec())
            .with_body("https://cdn.example.com/vod/seg2.ts", b"CCC".to_vec());
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[
                    manifest_ref("https://cdn.example.com/bad/media.m3u8"),
                    manifest_ref("https://cdn.example.com/vod/media.m3u8"),
                ],
                &cancel,
            )
            .await;

        // Outcomes come back in input order regardless of completion order.
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_done());
        assert!(outcomes[1].is_done());
    }

    #[tokio::test]
    async fn rerun_produces_identical_output() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_body("https://cdn.example.com/vod/seg0.ts", b"AAA".to_vec())
            .with_body("https://cdn.example.com/vod/seg1.ts", b"BBB".to_vec())
            .with_body("https://cdn.example.com/vod/seg2.ts", b"CCC".to_vec());
        let f = fixture(transport);
        let cancel = CancellationToken::new();
        let refs = [manifest_ref("https://cdn.example.com/vod/media.m3u8")];

        let first = f.pipeline.run(&refs, &cancel).await;
        let first_path = first[0].output.clone().unwrap();
        let first_bytes = std::fs::read(&first_path).unwrap();

        let second = f.pipeline.run(&refs, &cancel).await;
        let second_path = second[0].output.clone().unwrap();

        assert_eq!(first_path, second_path);
        assert_eq!(std::fs::read(&second_path).unwrap(), first_bytes);
    }

    #[tokio::test]
    async fn all_segments_failing_fails_at_assembling() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_status("https://cdn.example.com/vod/seg0.ts", 500)
            .with_status("https://cdn.example.com/vod/seg1.ts", 500)
            .with_status("https://cdn.example.com/vod/seg2.ts", 500);
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let outcomes = f
            .pipeline
            .run(
                &[manifest_ref("https://cdn.example.com/vod/media.m3u8")],
                &cancel,
            )
            .await;

        let outcome = &outcomes[0];
        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Assembling);
        assert_eq!(outcome.segments_failed, 3);
        assert!(temp_dir_is_empty(&f));
    }

    #[tokio::test]
    async fn cancellation_cleans_up_and_reports_fetch_stage() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_body("https://cdn.example.com/vod/seg0.ts", b"AAA".to_vec())
            .with_body("https://cdn.example.com/vod/seg1.ts", b"BBB".to_vec())
            .with_body("https://cdn.example.com/vod/seg2.ts", b"CCC".to_vec())
            .with_latency(
                "https://cdn.example.com/vod/seg1.ts",
                std::time::Duration::from_secs(30),
            );
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let manifest = manifest_ref("https://cdn.example.com/vod/media.m3u8");
        let run = f.pipeline.run_one(&manifest, &cancel);
        let outcome = tokio::select! {
            outcome = run => outcome,
            _ = async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                cancel.cancel();
                std::future::pending::<()>().await;
            } => unreachable!(),
        };

        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Fetching);
        assert_eq!(failure.cause, "cancelled");
        assert!(temp_dir_is_empty(&f));
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_slow_manifest_request() {
        let transport = FakeTransport::new()
            .with_text("https://cdn.example.com/vod/media.m3u8", MEDIA_3)
            .with_latency(
                "https://cdn.example.com/vod/media.m3u8",
                std::time::Duration::from_secs(30),
            );
        let f = fixture(transport);
        let cancel = CancellationToken::new();

        let manifest = manifest_ref("https://cdn.example.com/vod/media.m3u8");
        let run = f.pipeline.run_one(&manifest, &cancel);
        let outcome = tokio::select! {
            outcome = run => outcome,
            _ = async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                cancel.cancel();
                std::future::pending::<()>().await;
            } => unreachable!(),
        };

        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, Stage::Resolving);
        assert_eq!(failure.cause, "cancelled");
        assert!(outcome.output.is_none());
        assert!(temp_dir_is_empty(&f));
    }
}
