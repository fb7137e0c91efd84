//! JSON directory record source.
//!
//! Each category is a file `<dir>/<category>.json` holding a JSON array of
//! documents:
//!
//! ```json
//! [
//!   {"id": 1, "title": "Senior React Developer", "company": "Acme"},
//!   {"id": "job-2", "title": "Backend Node.js Developer"}
//! ]
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Result, SieveError};
use crate::record::Document;
use crate::source::RecordSource;
use crate::util::read_to_string_limited;

/// Record source that reads one JSON file per category.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    /// Directory holding the category files.
    dir: PathBuf,
}

impl JsonDirSource {
    /// Create a source over the given directory.
    ///
    /// The directory is not checked here; a missing directory surfaces as a
    /// storage error on the first fetch, which the manager treats as a
    /// retryable initialization failure.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this source reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path for a category file.
    pub fn category_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.json", category))
    }
}

impl RecordSource<Document> for JsonDirSource {
    fn fetch_all(&self, category: &str) -> Result<Vec<Document>> {
        if category.is_empty() || category.contains(['/', '\\']) || category.starts_with('.') {
            return Err(SieveError::source(format!(
                "invalid category name '{}'",
                category
            )));
        }

        let path = self.category_path(category);
        let content = read_to_string_limited(&path)?;
        let documents: Vec<Document> = serde_json::from_str(&content).map_err(|e| {
            SieveError::serde(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            category,
            path = %path.display(),
            count = documents.len(),
            "loaded corpus file"
        );

        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "json-dir"
    }
}
