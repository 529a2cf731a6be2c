///
/// This module implements the CLI interface for docintel-bucket: command parsing,
/// argument exposure and the async entrypoint shared by `main` and the tests.
///
/// All business logic (tree rewriting, catalog, pipeline) lives in the
/// [`docintel-bucket-core`] crate. This module only wires clients and files to it.
///
/// ## Subcommands
/// - `sync`: run the blob → analysis → blob pipeline described by a YAML config
/// - `normalize`: prune/project a local analysis JSON file into a new file
/// - `keys`: print every dotted key path of a local JSON file
///
/// [`docintel-bucket-core`]: ../../docintel-bucket-core/
use crate::docintel::DocIntelClient;
use crate::load_config::load_config;
use crate::storage::AzureBlobClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use docintel_bucket_core::output::{local_file_read, local_file_write, PayloadFormat};
use docintel_bucket_core::pipeline::{normalize, run_pipeline, NormalizeConfig};
use docintel_bucket_core::tree::{key_paths, KeySet};
use std::path::PathBuf;

/// CLI for docintel-bucket: analyze documents in blob storage and normalize the results.
#[derive(Parser)]
#[clap(
    name = "docintel-bucket",
    version,
    about = "Send blob-stored PDFs through document analysis and normalize the JSON results"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every PDF in the source container and write raw and normalized results
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Normalize a local analysis JSON file
    Normalize {
        /// Analysis result to read
        #[clap(long)]
        input: PathBuf,
        /// Directory to write the normalized file into
        #[clap(long)]
        output_dir: PathBuf,
        /// File name of the normalized file
        #[clap(long)]
        output_name: String,
        /// Key or dotted path to remove (repeatable)
        #[clap(long = "remove")]
        remove: Vec<String>,
        /// Key or dotted path to keep after pruning (repeatable)
        #[clap(long = "select")]
        select: Vec<String>,
    },
    /// Print every dotted key path in a local JSON file
    Keys {
        #[clap(long)]
        input: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Starting document pipeline");
            let store = AzureBlobClient::new_from_env()
                .map_err(|e| anyhow::Error::msg(format!("Blob storage client: {e}")))?;
            let analyzer = DocIntelClient::new_from_env()
                .map_err(|e| anyhow::Error::msg(format!("Document analysis client: {e}")))?;
            match run_pipeline(&store, &analyzer, &config.pipeline).await {
                Ok(report) => {
                    tracing::info!(command = "sync", ?report, "Document pipeline complete");
                    println!(
                        "Pipeline complete: {} processed, {} skipped",
                        report.documents.len(),
                        report.skipped.len()
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Document pipeline failed");
                    Err(anyhow::Error::msg(e))
                }
            }
        }
        Commands::Normalize {
            input,
            output_dir,
            output_name,
            remove,
            select,
        } => {
            let tree = local_file_read(&input, PayloadFormat::Json)
                .ok_or_else(|| anyhow::anyhow!("Could not read JSON from {}", input.display()))?;
            let config = NormalizeConfig {
                remove: remove.into_iter().collect(),
                select: (!select.is_empty()).then(|| select.into_iter().collect::<KeySet>()),
            };
            let normalized = normalize(tree, &config);
            if !local_file_write(&normalized, PayloadFormat::Json, &output_dir, &output_name) {
                anyhow::bail!("Could not write {}", output_dir.join(&output_name).display());
            }
            tracing::info!(command = "normalize", output = %output_dir.join(&output_name).display(), "Normalized file written");
            Ok(())
        }
        Commands::Keys { input } => {
            let tree = local_file_read(&input, PayloadFormat::Json)
                .ok_or_else(|| anyhow::anyhow!("Could not read JSON from {}", input.display()))?;
            for path in key_paths(&tree) {
                println!("{path}");
            }
            Ok(())
        }
    }
}
