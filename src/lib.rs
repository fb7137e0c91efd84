//! Sieve - embedded fuzzy full-text search over character trigrams.
//!
//! Sieve keeps an in-memory inverted index from padded character trigrams
//! to record ids, tolerant of typos and partial words, and ranks matches by
//! the share of query trigrams each record contains. An [`IndexManager`]
//! owns one index per record category, loads the corpus from a
//! [`RecordSource`] at startup and accepts incremental upserts afterwards.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod record;
pub mod source;
pub mod util;

pub use config::Config;
pub use engine::{
    generate_trigrams, normalize, tokenize, IndexStats, Normalizer, ScoredRecord, Trigram,
    TrigramIndex, DEFAULT_THRESHOLD,
};
pub use error::{FailOpen, Result, SieveError};
pub use manager::{IndexManager, ManagerStatus};
pub use record::{Document, RecordId, Searchable};
pub use source::{JsonDirSource, MemoryRecordSource, RecordSource};

// CLI commands
pub use cli::{SearchCommand, StatsCommand};
