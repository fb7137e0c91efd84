//! Index manager: one trigram index per record category.
//!
//! The manager is an explicit context object. Construct it once at startup,
//! call [`IndexManager::initialize`], and share it (typically behind an
//! `Arc`) with whatever handles queries and writes.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --initialize--> Initializing --ok--> Ready
//!       ^                            |
//!       +----------- error ----------+
//! ```
//!
//! `Ready` is terminal; further `initialize` calls return immediately
//! without touching the record source. A failed attempt leaves the manager
//! `Uninitialized` so the caller may retry. Queries never fail: before the
//! first successful build they simply find nothing.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::{Config, SearchConfig};
use crate::engine::{IndexStats, Normalizer, ScoredRecord, TrigramIndex};
use crate::error::{FailOpen, Result, SieveError};
use crate::record::Searchable;
use crate::source::RecordSource;

/// Manager lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManagerStatus {
    /// No successful build yet.
    #[default]
    Uninitialized,
    /// Corpus fetch and build in progress.
    Initializing,
    /// Indexes built from the record source.
    Ready,
}

impl ManagerStatus {
    /// Whether the indexes have been built at least once.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Lowercase name for display and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        }
    }
}

/// Owns one [`TrigramIndex`] per category and keeps them fed from a
/// [`RecordSource`].
pub struct IndexManager<R: Searchable, S: RecordSource<R>> {
    source: S,
    settings: SearchConfig,
    normalizer: Normalizer,
    indexes: BTreeMap<String, TrigramIndex<R>>,
    status: RwLock<ManagerStatus>,
    /// Serializes initialize/rebuild so only one corpus load runs at a time.
    lifecycle: Mutex<()>,
}

impl<R: Searchable, S: RecordSource<R>> IndexManager<R, S> {
    /// Create a manager with default settings and no categories.
    pub fn new(source: S) -> Self {
        Self {
            source,
            settings: SearchConfig::default(),
            normalizer: Normalizer::default(),
            indexes: BTreeMap::new(),
            status: RwLock::new(ManagerStatus::Uninitialized),
            lifecycle: Mutex::new(()),
        }
    }

    /// Create a manager with the settings, normalizer and categories from `config`.
    pub fn from_config(source: S, config: &Config) -> Self {
        let mut manager = Self::new(source)
            .with_settings(config.search.clone())
            .with_normalizer(config.normalize.normalizer());
        for (name, category) in &config.categories {
            manager = manager.with_category(name.clone(), category.fields.clone());
        }
        manager
    }

    /// Replace the search settings.
    pub fn with_settings(mut self, settings: SearchConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Set the normalizer used by categories registered after this call.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Register a category indexed over `fields`.
    ///
    /// Registering the same name twice replaces the earlier index.
    pub fn with_category<I, F>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        let index = TrigramIndex::with_normalizer(fields, self.normalizer.clone());
        self.indexes.insert(name.into(), index);
        self
    }

    /// Registered category names, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    /// The settings queries run with.
    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    /// Direct access to a category's index, e.g. for scored queries.
    pub fn index(&self, category: &str) -> Option<&TrigramIndex<R>> {
        self.indexes.get(category)
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ManagerStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the indexes have been built.
    pub fn is_ready(&self) -> bool {
        self.status().is_ready()
    }

    /// Build every category index from the record source, once.
    ///
    /// Returns immediately when already `Ready`. Concurrent callers wait for
    /// the in-flight attempt and then observe its outcome. On failure the
    /// manager is left `Uninitialized` and the source error is returned.
    pub fn try_initialize(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_ready() {
            return Ok(());
        }

        self.set_status(ManagerStatus::Initializing);
        match self.load_all() {
            Ok(documents) => {
                self.set_status(ManagerStatus::Ready);
                tracing::info!(
                    source = self.source.name(),
                    categories = self.indexes.len(),
                    documents,
                    "search index ready"
                );
                Ok(())
            }
            Err(e) => {
                self.set_status(ManagerStatus::Uninitialized);
                Err(e)
            }
        }
    }

    /// Fail-open wrapper around [`try_initialize`](Self::try_initialize).
    ///
    /// Errors are logged, never returned; the resulting state tells the
    /// caller whether to retry later.
    pub fn initialize(&self) -> ManagerStatus {
        self.try_initialize()
            .fail_open_with("initializing search index", ());
        self.status()
    }

    /// Re-fetch the corpus and rebuild every index, regardless of state.
    ///
    /// This is how stale postings left behind by [`upsert`](Self::upsert)
    /// are cleared. If the fetch fails the current indexes stay as they are.
    pub fn rebuild(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let documents = self.load_all()?;
        self.set_status(ManagerStatus::Ready);
        tracing::info!(
            source = self.source.name(),
            documents,
            "search index rebuilt"
        );
        Ok(())
    }

    /// Ranked records in `category` matching `query`, at most `limit` of them.
    ///
    /// Unknown categories and unbuilt indexes yield an empty list.
    pub fn search(&self, category: &str, query: &str, limit: usize) -> Vec<R> {
        self.search_scored(category, query, limit)
            .into_iter()
            .map(|hit| hit.record)
            .collect()
    }

    /// Like [`search`](Self::search), keeping the relevance scores.
    pub fn search_scored(&self, category: &str, query: &str, limit: usize) -> Vec<ScoredRecord<R>> {
        let Some(index) = self.indexes.get(category) else {
            tracing::debug!(category, "search in unknown category");
            return Vec::new();
        };
        if !self.is_ready() {
            tracing::debug!(category, status = self.status().as_str(), "search before index is ready");
        }

        let mut hits = index.search_with_threshold(query, self.settings.threshold);
        hits.truncate(limit);
        hits
    }

    /// Index a new or modified record without a full rebuild.
    ///
    /// Postings from the record's previous text are kept until the next
    /// [`rebuild`](Self::rebuild). Records upserted before initialization
    /// are dropped by the initial build, which loads the source's view.
    pub fn upsert(&self, category: &str, record: R) -> Result<()> {
        let index = self
            .indexes
            .get(category)
            .ok_or_else(|| SieveError::unknown_category(category))?;
        tracing::debug!(category, id = ?record.id(), "upserting record");
        index.update_item(record);
        Ok(())
    }

    /// Size and build time of every category index.
    pub fn stats(&self) -> BTreeMap<String, IndexStats> {
        self.indexes
            .iter()
            .map(|(name, index)| (name.clone(), index.stats()))
            .collect()
    }

    /// Fetch every category, then build every index.
    ///
    /// Nothing is built unless all fetches succeed, so a failure never leaves
    /// some categories on new data and others on old.
    fn load_all(&self) -> Result<usize> {
        let mut corpora = Vec::with_capacity(self.indexes.len());
        for (name, index) in &self.indexes {
            let records = self.source.fetch_all(name).map_err(|e| {
                tracing::warn!(
                    source = self.source.name(),
                    category = %name,
                    error = %e,
                    "failed to fetch corpus"
                );
                e
            })?;
            corpora.push((index, records));
        }

        let mut documents = 0;
        for (index, records) in corpora {
            index.build_index(records);
            documents += index.len();
        }
        Ok(documents)
    }

    fn set_status(&self, status: ManagerStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}
