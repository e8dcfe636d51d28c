//! OHMC Sync Core Library
//!
//! This library discovers meteorological imagery products published on the
//! OHMC public file server (WRF model frames, greenhouse-gas charts, the
//! fire-weather index, the road-wind animation) and reconciles them into a
//! durable catalog, optionally materializing local image copies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`db`] - Database connection and schema management
//! - [`catalog`] - Product/valid-time records, reconciliation, read queries
//! - [`fetch`] - HTTP layer: listings, image downloads, rate limiting
//! - [`decode`] - Pure filename decoding and valid-time resolution
//! - [`crawl`] - Per-family configuration and crawl planners
//! - [`materialize`] - Best-effort local image copies
//! - [`sync`] - Top-level orchestration and run summaries

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod crawl;
pub mod db;
pub mod decode;
pub mod fetch;
pub mod materialize;
pub mod sync;

// Re-export commonly used types
pub use catalog::{
    Catalog, CatalogError, CatalogStats, DateSummary, Discovery, HourSummary, LatestProduct,
    Product, ProductFamily, ProductFilter, ReconcileOutcome, ValidTime, VariableSummary,
};
pub use crawl::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_SERVER_ROOT, FamilyConfig, FixedFile, SyncOptions, Topology,
};
pub use db::Database;
pub use decode::{GriddedFrame, RunDirectory, day_of_month, resolve_valid_time};
pub use fetch::{FetchError, HttpFetcher, RateLimiter};
pub use materialize::{ImageRef, MaterializeOutcome, materialize};
pub use sync::{FamilyCounts, FamilySummary, SyncError, SyncSummary, Synchronizer};
