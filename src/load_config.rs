/// `load_config` module: Loads a static YAML config into the core [`PipelineConfig`].
///
/// This module is the only place where user-supplied YAML is parsed. Secrets
/// (storage account URL, analysis endpoint and key) never live in the file; the
/// clients read them from the environment.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
///
/// Accepted schema:
///
/// ```yaml
/// pipeline:
///   model_id: prebuilt-layout      # optional
///   source_container: raw
///   output_container: processed
///   raw_directory: raw_results     # optional
///   processed_directory: dictionaries  # optional
///   remove_keys: [confidence, spans, polygon]
///   select_keys: [content, paragraphs.content, paragraphs.page_number]  # optional
/// ```
use anyhow::Result;
use docintel_bucket_core::config::PipelineConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub pipeline: PipelineConfig,
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.pipeline.source_container.trim().is_empty() {
        error!(config_path = ?path_ref, "pipeline.source_container is empty");
        anyhow::bail!("pipeline.source_container must not be empty");
    }
    if config.pipeline.output_container.trim().is_empty() {
        error!(config_path = ?path_ref, "pipeline.output_container is empty");
        anyhow::bail!("pipeline.output_container must not be empty");
    }

    config.pipeline.trace_loaded();
    Ok(config)
}
