//! Read-through caching layer for the storefront catalog
//!
//! This crate provides the caching core of the storefront:
//! - Fail-soft KV store adapter with per-tier TTLs
//! - Per-resource read-through policies with single-flight coalescing
//! - Batch fetch orchestration with `not_found` reporting
//! - Aggregate snapshot cache ("super cache") with explicit population
//! - Scope-based invalidation over the hand-maintained key list

pub mod batch;
pub mod catalog;
mod error;
pub mod invalidate;
pub mod kv;
pub mod singleflight;
pub mod snapshot;
pub mod stats;
pub mod tier;

pub use batch::BatchOutcome;
pub use catalog::CachedCatalog;
pub use error::{Error, Result};
pub use invalidate::{InvalidationReport, Invalidator, Scope};
pub use kv::{CacheStore, KvError, KvStore, MemoryKvStore, RestKvStore};
pub use snapshot::{PopulateReport, Snapshot, SnapshotCache, SnapshotData, SnapshotStatus};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use tier::{CacheTier, keys};
