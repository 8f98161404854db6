//! In-memory activity storage and aggregation.
//!
//! This module contains:
//! - The event store holding raw timestamps per entity and activity kind
//! - Window count aggregation over those timestamps
//! - The shared tracker that serializes access to both

pub mod event_store;
pub mod stats;
pub mod tracker;

// Re-export commonly used types
pub use event_store::{EntityRecord, EventStore};
pub use stats::{EntityStats, StatsRegistry, TimestampParseError, WindowCounts, WindowThresholds};
pub use tracker::{create_shared_tracker, ActivityTracker, SharedTracker};
