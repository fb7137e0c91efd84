//! Trigram search engine.
//!
//! Text flows through three stages, each usable on its own:
//!
//! - [`normalize`]: case folding, variant folding, punctuation stripping
//! - [`trigram`]: tokenization and padded trigram generation
//! - [`index`]: the inverted index, document store and scoring
//!
//! # Usage
//!
//! ```
//! use sieve::engine::TrigramIndex;
//! use sieve::record::Document;
//!
//! let index = TrigramIndex::from_records(
//!     vec![Document::new("1").with_field("title", "Senior React Developer")],
//!     ["title"],
//! );
//!
//! // Typos still land on the right record.
//! let hits = index.search("Reactt");
//! assert_eq!(hits[0].record.get_str("title"), Some("Senior React Developer"));
//! ```

pub mod index;
pub mod normalize;
pub mod trigram;

pub use index::{IndexStats, ScoredRecord, TrigramIndex, DEFAULT_THRESHOLD};
pub use normalize::{normalize, Normalizer};
pub use trigram::{generate_trigrams, tokenize, Trigram};
