//! Record source trait for Sieve.
//!
//! A record source is whatever owns the authoritative corpus: a database
//! table, a service, a directory of JSON files. The index manager only ever
//! asks it for everything at once.

use std::sync::Arc;

use crate::error::Result;

/// Trait for bulk suppliers of searchable records.
///
/// There is no pagination: `fetch_all` returns the full eligible set for a
/// category in one call, and the whole set must fit in memory.
pub trait RecordSource<R>: Send + Sync {
    /// Fetch every currently eligible record in `category`.
    fn fetch_all(&self, category: &str) -> Result<Vec<R>>;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Blanket implementation of RecordSource for Arc-wrapped sources.
///
/// Lets tests keep a handle on a source after handing it to a manager.
impl<R, T: RecordSource<R> + ?Sized> RecordSource<R> for Arc<T> {
    fn fetch_all(&self, category: &str) -> Result<Vec<R>> {
        (**self).fetch_all(category)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

