//! Process-wide query cache.
//!
//! This module provides the `QueryCache` that holds server-derived state
//! keyed by query identity. Entries are marked stale by `invalidate` and
//! refetched by their owner on next access; `clear` drops everything.

pub mod query;

pub use query::{CachedData, QueryCache, QueryKey};
