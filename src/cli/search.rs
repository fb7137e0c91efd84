//! Search command for Sieve.
//!
//! Loads the corpus, builds the index and runs one query against a category.

use serde::{Deserialize, Serialize};

use crate::engine::ScoredRecord;
use crate::manager::IndexManager;
use crate::record::{Document, RecordId, Searchable};
use crate::source::RecordSource;

/// Options for the search command.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of results (config default when unset).
    pub limit: Option<usize>,
}

/// Output format for the search command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    /// Whether the search was successful.
    pub success: bool,
    /// The category searched.
    pub category: String,
    /// The search query used.
    pub query: String,
    /// Number of results found.
    pub count: usize,
    /// The search results, best first.
    pub results: Vec<SearchResultInfo>,
    /// Error message if search failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Simplified result info for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultInfo {
    /// Record ID.
    pub id: RecordId,
    /// Text of the first indexed field, used as a headline.
    pub headline: String,
    /// Relevance score.
    pub relevance: f64,
}

impl SearchResultInfo {
    fn from_hit(hit: &ScoredRecord<Document>, fields: &[String]) -> Self {
        let headline = fields
            .iter()
            .find_map(|name| hit.record.field(name))
            .map(|text| text.into_owned())
            .unwrap_or_default();
        Self {
            id: hit.record.id.clone(),
            headline,
            relevance: hit.score,
        }
    }
}

impl SearchOutput {
    /// Create a successful output.
    pub fn success(
        category: impl Into<String>,
        query: impl Into<String>,
        results: Vec<SearchResultInfo>,
    ) -> Self {
        let count = results.len();
        Self {
            success: true,
            category: category.into(),
            query: query.into(),
            count,
            results,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(
        category: impl Into<String>,
        query: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            category: category.into(),
            query: query.into(),
            count: 0,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The search command implementation.
pub struct SearchCommand<S: RecordSource<Document>> {
    manager: IndexManager<Document, S>,
}

impl<S: RecordSource<Document>> SearchCommand<S> {
    /// Create a new search command over a configured manager.
    pub fn new(manager: IndexManager<Document, S>) -> Self {
        Self { manager }
    }

    /// Run the search command with the given query.
    pub fn run(&self, category: &str, query: &str, options: &SearchOptions) -> SearchOutput {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return SearchOutput::failure(category, "", "Search query cannot be empty");
        }

        let Some(index) = self.manager.index(category) else {
            let known: Vec<&str> = self.manager.categories().collect();
            return SearchOutput::failure(
                category,
                trimmed_query,
                format!(
                    "Unknown category '{}'. Known categories: {}",
                    category,
                    known.join(", ")
                ),
            );
        };

        if let Err(e) = self.manager.try_initialize() {
            return SearchOutput::failure(category, trimmed_query, e.to_string());
        }

        let limit = options
            .limit
            .unwrap_or(self.manager.settings().default_limit);
        let hits = self.manager.search_scored(category, trimmed_query, limit);
        let results = hits
            .iter()
            .map(|hit| SearchResultInfo::from_hit(hit, index.fields()))
            .collect();

        SearchOutput::success(category, trimmed_query, results)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SearchOutput, options: &SearchOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &SearchOutput) -> String {
        if !output.success {
            return format!(
                "Search failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.results.is_empty() {
            return format!(
                "No {} found for query: \"{}\"\n",
                output.category, output.query
            );
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "Found {} {} for query: \"{}\"\n",
            output.count, output.category, output.query
        ));

        for (i, result) in output.results.iter().enumerate() {
            lines.push(format!(
                "{}. {} (relevance: {:.2})",
                i + 1,
                result.headline,
                result.relevance
            ));
            lines.push(format!("   ID: {}", result.id));
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
