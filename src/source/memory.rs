//! In-memory record source.
//!
//! Thread-safe implementation of `RecordSource` backed by
//! `RwLock<HashMap>`. Used by tests and by embedders that already hold
//! their corpus in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::{Result, SieveError};
use crate::source::RecordSource;

/// In-memory record source keyed by category.
#[derive(Debug)]
pub struct MemoryRecordSource<R> {
    /// Records per category, in insertion order.
    records: RwLock<HashMap<String, Vec<R>>>,
    /// When false, every fetch fails as if the store were unreachable.
    available: AtomicBool,
    /// Number of `fetch_all` calls served or refused.
    fetches: AtomicUsize,
}

impl<R> Default for MemoryRecordSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MemoryRecordSource<R> {
    /// Create a new empty, available source.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Append a record to a category.
    pub fn insert(&self, category: impl Into<String>, record: R) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(category.into())
            .or_default()
            .push(record);
    }

    /// Replace all records in a category.
    pub fn replace(&self, category: impl Into<String>, records: Vec<R>) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(category.into(), records);
    }

    /// Number of records in a category.
    pub fn len(&self, category: &str) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(category)
            .map_or(0, Vec::len)
    }

    /// Simulate the backing store going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// How many times `fetch_all` has been called.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<R: Clone + Send + Sync> RecordSource<R> for MemoryRecordSource<R> {
    fn fetch_all(&self, category: &str) -> Result<Vec<R>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(SieveError::source("memory source is unavailable"));
        }
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(category).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
