//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::VariantPolicy;

/// HLS stream downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "hls-stitch",
    version,
    about = "Download HLS streams and stitch them into single media files",
    long_about = "Resolves HLS manifest URLs to media playlists, downloads every segment,\n\
                  and merges them into one playable file per URL via ffmpeg stream copy.\n\n\
                  Individual segment failures degrade the output instead of aborting;\n\
                  one failing URL never stops the rest of the batch."
)]
pub struct Args {
    /// Manifest URL(s) to download.
    pub urls: Vec<String>,

    /// File containing one manifest URL per line ('#' lines are skipped).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for merged output files.
    #[arg(short = 'd', long = "directory")]
    pub output_directory: Option<PathBuf>,

    /// Root directory for temporary segment artifacts.
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Number of URLs processed concurrently.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Concurrent segment downloads per URL.
    #[arg(long)]
    pub segment_concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Fetch attempts per segment before it counts as failed.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Timeout in seconds for one concat tool invocation.
    #[arg(long)]
    pub tool_timeout: Option<u64>,

    /// Variant selection policy for master playlists.
    #[arg(long, value_enum)]
    pub variant_policy: Option<VariantPolicyArg>,

    /// Output filename without extension (single URL only).
    #[arg(short = 'o', long)]
    pub output_name: Option<String>,

    /// Write a JSON report of per-URL outcomes to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// User agent sent with every request.
    #[arg(short = 'a', long = "user-agent", env = "HLS_STITCH_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Suppress banner, progress bars, and summaries.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI variant policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantPolicyArg {
    /// Take the first listed variant.
    FirstListed,
    /// Take the variant with the highest declared bandwidth.
    HighestBandwidth,
}

impl From<VariantPolicyArg> for VariantPolicy {
    fn from(arg: VariantPolicyArg) -> Self {
        match arg {
            VariantPolicyArg::FirstListed => VariantPolicy::FirstListed,
            VariantPolicyArg::HighestBandwidth => VariantPolicy::HighestBandwidth,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) -> Result<()> {
        let mut urls = self.urls;
        if let Some(input) = &self.input {
            urls.extend(read_url_file(input)?);
        }
        if !urls.is_empty() {
            config.sources.urls = urls;
        }

        if let Some(dir) = self.output_directory {
            config.options.output_directory = dir;
        }

        if let Some(dir) = self.temp_dir {
            config.options.temp_directory = Some(dir);
        }

        if let Some(workers) = self.workers {
            config.options.worker_count = workers;
        }

        if let Some(concurrency) = self.segment_concurrency {
            config.options.segment_concurrency = concurrency;
        }

        if let Some(timeout) = self.timeout {
            config.options.request_timeout_secs = timeout;
        }

        if let Some(retries) = self.retries {
            config.options.segment_attempts = retries;
        }

        if let Some(tool_timeout) = self.tool_timeout {
            config.options.tool_timeout_secs = tool_timeout;
        }

        if let Some(policy) = self.variant_policy {
            config.options.variant_policy = policy.into();
        }

        if let Some(name) = self.output_name {
            config.options.output_name = Some(name);
        }

        if let Some(report) = self.report {
            config.options.report_path = Some(report);
        }

        if let Some(user_agent) = self.user_agent {
            config.options.user_agent = user_agent;
        }

        if self.quiet {
            config.options.show_progress = false;
        }

        Ok(())
    }
}

/// Read a newline-separated URL list, skipping blanks and '#' comments.
fn read_url_file(path: &PathBuf) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
