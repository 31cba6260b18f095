//! Configuration validation.

use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fs::naming::sanitize_filename;

/// Validate the configuration before any work starts.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.sources.urls.is_empty() {
        return Err(Error::MissingConfig(
            "at least one manifest URL (positional argument, --input file, or [sources] urls)"
                .to_string(),
        ));
    }

    for raw in &config.sources.urls {
        let url = Url::parse(raw).map_err(|e| Error::ConfigValidation {
            field: "sources.urls".to_string(),
            message: format!("invalid URL '{}': {}", raw, e),
        })?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::ConfigValidation {
                    field: "sources.urls".to_string(),
                    message: format!("unsupported scheme '{}' in '{}'", other, raw),
                });
            }
        }
    }

    if config.options.worker_count == 0 {
        return Err(Error::ConfigValidation {
            field: "options.worker_count".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.options.segment_concurrency == 0 {
        return Err(Error::ConfigValidation {
            field: "options.segment_concurrency".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.options.request_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "options.request_timeout_secs".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.options.tool_timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "options.tool_timeout_secs".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if config.options.segment_attempts == 0 {
        return Err(Error::ConfigValidation {
            field: "options.segment_attempts".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if let Some(name) = &config.options.output_name {
        if config.sources.urls.len() != 1 {
            return Err(Error::ConfigValidation {
                field: "options.output_name".to_string(),
                message: "only applies when exactly one URL is given".to_string(),
            });
        }
        sanitize_filename(name)?;
    }

    Ok(())
}
