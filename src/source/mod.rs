//! Record sources for Sieve.
//!
//! The index is never authoritative: it is rebuilt from a record source at
//! startup and on demand. This module defines the source contract and two
//! implementations, in-memory and JSON-directory.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonDirSource;
pub use memory::MemoryRecordSource;
pub use traits::RecordSource;
