//! CLI commands for Sieve.
//!
//! - **search**: run one query against a category
//! - **stats**: build the index and report its size

pub mod search;
pub mod stats;

pub use search::{SearchCommand, SearchOptions, SearchOutput};
pub use stats::{StatsCommand, StatsOptions, StatsOutput};
