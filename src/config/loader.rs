//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::fetch::FetchOptions;
use crate::manifest::{ManifestRef, VariantPolicy};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// Manifest source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Manifest URLs to process, in order.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Directory receiving merged output files.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Root for temporary segment artifacts; system temp dir when unset.
    #[serde(default)]
    pub temp_directory: Option<PathBuf>,

    /// Bounded worker pool size for the batch loop over URLs.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Concurrent segment downloads within one URL's pipeline.
    #[serde(default = "default_segment_concurrency")]
    pub segment_concurrency: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Fetch attempts per segment before it counts as failed.
    #[serde(default = "default_segment_attempts")]
    pub segment_attempts: u32,

    /// Base retry backoff in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Timeout in seconds for one concat tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Variant selection policy for master playlists.
    #[serde(default)]
    pub variant_policy: VariantPolicy,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Show per-URL segment progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Output filename (without extension) when processing a single URL.
    #[serde(default)]
    pub output_name: Option<String>,

    /// Optional path for a JSON report of per-URL outcomes.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            temp_directory: None,
            worker_count: default_worker_count(),
            segment_concurrency: default_segment_concurrency(),
            request_timeout_secs: default_request_timeout(),
            segment_attempts: default_segment_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            tool_timeout_secs: default_tool_timeout(),
            variant_policy: VariantPolicy::default(),
            user_agent: default_user_agent(),
            show_progress: true,
            output_name: None,
            report_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective temporary-artifact root.
    pub fn temp_directory(&self) -> PathBuf {
        self.options
            .temp_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.options.request_timeout_secs)
    }

    /// Timeout for one concat tool invocation.
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.options.tool_timeout_secs)
    }

    /// Segment fetch tuning derived from the options.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.options.segment_concurrency,
            max_attempts: self.options.segment_attempts,
            retry_backoff: Duration::from_millis(self.options.retry_backoff_ms),
        }
    }

    /// Parse the configured URLs into manifest references.
    ///
    /// `output_name` only labels a single-URL batch; `validate_config`
    /// enforces that before this is called.
    pub fn manifest_refs(&self) -> Result<Vec<ManifestRef>> {
        let mut refs = Vec::with_capacity(self.sources.urls.len());
        for raw in &self.sources.urls {
            let url = Url::parse(raw)?;
            refs.push(match &self.options.output_name {
                Some(label) => ManifestRef::with_label(url, label.clone()),
                None => ManifestRef::new(url),
            });
        }
        Ok(refs)
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_worker_count() -> usize {
    4
}

fn default_segment_concurrency() -> usize {
    4
}

fn default_request_timeout() -> u64 {
    10
}

fn default_segment_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_tool_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.options.worker_count, 4);
        assert_eq!(config.options.segment_concurrency, 4);
        assert_eq!(config.options.request_timeout_secs, 10);
        assert_eq!(config.options.tool_timeout_secs, 300);
        assert_eq!(config.options.variant_policy, VariantPolicy::FirstListed);
    }

    #[test]
    fn toml_overrides_apply() {
        let config: Config = toml::from_str(
            r#"
            [sources]
            urls = ["https://cdn.example.com/vod/media.m3u8"]

            [options]
            worker_count = 8
            variant_policy = "highest-bandwidth"
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.urls.len(), 1);
        assert_eq!(config.options.worker_count, 8);
        assert_eq!(
            config.options.variant_policy,
            VariantPolicy::HighestBandwidth
        );
        // Untouched fields keep defaults.
        assert_eq!(config.options.segment_attempts, 3);
    }

    #[test]
    fn manifest_refs_carry_the_output_name() {
        let mut config = Config::default();
        config.sources.urls = vec!["https://cdn.example.com/vod/media.m3u8".into()];
        config.options.output_name = Some("sintel".into());

        let refs = config.manifest_refs().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].label.as_deref(), Some("sintel"));
    }
}
