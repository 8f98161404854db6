//! Reckoning - rolling activity counts for named things.
//!
//! Callers record activity occurrences ("install", "uninstall", ...) against a
//! named entity. Every recording refreshes that entity's cached counts over four
//! rolling windows: today, the last 7 days, the last calendar month and the last
//! calendar year.
//!
//! # Architecture
//!
//! ```text
//! POST /{thing} ──→ EventStore ──→ StatsRegistry (recompute) ──→ cached EntityStats
//!                        └────── one lock (ActivityTracker) ──────┘
//! GET /{thing}  ──→ cached EntityStats (no recompute)
//! ```
//!
//! # Example
//!
//! ```
//! use reckoning::store::ActivityTracker;
//!
//! let tracker = ActivityTracker::new();
//! tracker.ingest("mypackage", &["install"]);
//!
//! let stats = tracker.stats("mypackage").unwrap();
//! assert_eq!(stats.activities["install"].today, 1);
//! ```

pub mod config;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use store::{
    ActivityTracker, EntityRecord, EntityStats, EventStore, SharedTracker, StatsRegistry,
    WindowCounts,
};

#[cfg(feature = "server")]
pub use server::{create_router, run, ServerConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
