//! Storage module for file management
//!
//! Provides a local directory cache holding raw copies of uploaded files so
//! they can be served back without contacting the provider.

mod local_cache;

pub use local_cache::{CacheError, CacheWriteOutcome, LocalFileCache};
