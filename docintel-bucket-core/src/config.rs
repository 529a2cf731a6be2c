use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tree::KeySet;

fn default_raw_directory() -> String {
    "raw_results".to_string()
}

fn default_processed_directory() -> String {
    "dictionaries".to_string()
}

fn default_model_id() -> String {
    "prebuilt-layout".to_string()
}

/// One batch run: which container to read PDFs from, which model to analyze
/// them with, where to write the results and how to normalize them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    pub source_container: String,
    pub output_container: String,
    /// Virtual directory for the untouched analysis JSON.
    #[serde(default = "default_raw_directory")]
    pub raw_directory: String,
    /// Virtual directory for the normalized JSON.
    #[serde(default = "default_processed_directory")]
    pub processed_directory: String,
    #[serde(default)]
    pub remove_keys: KeySet,
    /// When set, the pruned tree is further reduced to these keys.
    #[serde(default)]
    pub select_keys: Option<KeySet>,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            model_id = %self.model_id,
            source_container = %self.source_container,
            output_container = %self.output_container,
            remove_keys = self.remove_keys.len(),
            select_keys = ?self.select_keys.as_ref().map(KeySet::len),
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}
