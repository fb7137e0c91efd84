//! Stats command for Sieve.
//!
//! Builds the index and reports per-category sizes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::IndexStats;
use crate::manager::{IndexManager, ManagerStatus};
use crate::record::Document;
use crate::source::RecordSource;

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    /// Manager state after the build attempt.
    pub status: ManagerStatus,
    /// Per-category index statistics.
    pub categories: BTreeMap<String, IndexStats>,
    /// Error message if the corpus could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsOutput {
    /// Whether the index was built.
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// The stats command implementation.
pub struct StatsCommand<S: RecordSource<Document>> {
    manager: IndexManager<Document, S>,
}

impl<S: RecordSource<Document>> StatsCommand<S> {
    /// Create a new stats command over a configured manager.
    pub fn new(manager: IndexManager<Document, S>) -> Self {
        Self { manager }
    }

    /// Build the index and collect statistics.
    pub fn run(&self) -> StatsOutput {
        let error = self.manager.try_initialize().err().map(|e| e.to_string());
        StatsOutput {
            status: self.manager.status(),
            categories: self.manager.stats(),
            error,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            Self::format_human_readable(output)
        }
    }

    fn format_human_readable(output: &StatsOutput) -> String {
        let mut lines = vec![format!("Index status: {}", output.status.as_str())];
        if let Some(error) = &output.error {
            lines.push(format!("Error: {}", error));
        }

        for (name, stats) in &output.categories {
            let built = stats
                .built_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string());
            lines.push(format!(
                "{}: {} documents, {} trigrams, {} postings (built: {})",
                name, stats.documents, stats.trigrams, stats.postings, built
            ));
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
