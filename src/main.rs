//! hls-stitch CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use hls_stitch::{
    assemble::FfmpegConcatenator,
    cli::Args,
    config::{validate_config, Config},
    error::{exit_codes, Error, Result},
    fetch::HttpClient,
    fs::ensure_dir,
    output::{
        print_banner, print_batch_summary, print_config_summary, print_error, print_info,
        print_outcomes, print_success, print_warning, write_json_report,
    },
    pipeline::{BatchStats, Pipeline, PipelineOptions},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::InvalidFilename(_)
                | Error::TomlParse(_)
                | Error::UrlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Manifest(_) | Error::Fetch(_) | Error::Assemble(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    let quiet = args.quiet;
    if !quiet {
        print_banner();
    }

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    // Merge CLI arguments into config and validate
    args.merge_into_config(&mut config)?;
    validate_config(&config)?;

    if !quiet {
        print_config_summary(
            config.sources.urls.len(),
            &config.options.variant_policy.to_string(),
            &config.options.output_directory.display().to_string(),
        );
    }

    let refs = config.manifest_refs()?;

    ensure_dir(&config.options.output_directory)?;
    ensure_dir(&config.temp_directory())?;

    // Build the pipeline
    let transport = Arc::new(HttpClient::new(
        &config.options.user_agent,
        config.request_timeout(),
    )?);
    let pipeline = Pipeline::new(
        transport,
        Arc::new(FfmpegConcatenator::new(config.tool_timeout())),
        PipelineOptions {
            output_dir: config.options.output_directory.clone(),
            temp_dir: config.temp_directory(),
            worker_count: config.options.worker_count,
            fetch: config.fetch_options(),
            variant_policy: config.options.variant_policy,
            show_progress: config.options.show_progress && !quiet,
        },
    );

    // Ctrl-C cancels in-flight work; artifacts already written still get
    // cleaned up before the pipelines return.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let outcomes = pipeline.run(&refs, &cancel).await;

    if !quiet {
        print_outcomes(&outcomes);
        print_batch_summary(&BatchStats::from_outcomes(&outcomes));
    }

    if let Some(report_path) = &config.options.report_path {
        write_json_report(&outcomes, report_path)?;
        if !quiet {
            print_info(&format!("Report written to {}", report_path.display()));
        }
    }

    if cancel.is_cancelled() {
        print_warning("Aborted");
        return Ok(ExitCode::from(exit_codes::ABORT as u8));
    }

    let failed = outcomes.iter().filter(|o| !o.is_done()).count();
    if failed == outcomes.len() {
        Ok(ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8))
    } else if failed > 0 {
        Ok(ExitCode::from(exit_codes::SOME_URLS_FAILED as u8))
    } else {
        if !quiet {
            print_success(&format!("All {} URL(s) completed", outcomes.len()));
        }
        Ok(ExitCode::from(exit_codes::SUCCESS as u8))
    }
}
