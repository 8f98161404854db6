//! Thread-safe front door over the event store and stats registry.
//!
//! Both registries sit behind a single lock. An ingest holds it for the whole
//! record-then-recompute sequence, a query holds it only long enough to clone
//! the cached stats.

use crate::store::event_store::{EntityRecord, EventStore};
use crate::store::stats::{EntityStats, StatsRegistry};
use chrono::{DateTime, FixedOffset, Local};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Registries {
    events: EventStore,
    stats: StatsRegistry,
}

/// Records activity and serves cached window counts.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    inner: Mutex<Registries>,
}

impl ActivityTracker {
    /// Create a tracker with empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `activities` for `name` now and refresh its cached stats.
    ///
    /// Returns the number of events recorded.
    pub fn ingest<S: AsRef<str>>(&self, name: &str, activities: &[S]) -> usize {
        self.ingest_at(name, activities, Local::now().into())
    }

    /// Record `activities` for `name` at `at` and recompute against `at`.
    pub fn ingest_at<S: AsRef<str>>(
        &self,
        name: &str,
        activities: &[S],
        at: DateTime<FixedOffset>,
    ) -> usize {
        let mut guard = self.inner.lock();
        let Registries { events, stats } = &mut *guard;

        events.record_activities_at(name, activities, at);
        stats.recompute_at(events, name, at);

        tracing::debug!("Recorded {} activities for {:?}", activities.len(), name);
        activities.len()
    }

    /// Cached stats for `name`. Never recomputes.
    pub fn stats(&self, name: &str) -> Option<EntityStats> {
        self.inner.lock().stats.get(name).cloned()
    }

    /// Cached stats for every entity.
    pub fn all_stats(&self) -> BTreeMap<String, EntityStats> {
        self.inner.lock().stats.list_all()
    }

    /// Raw recorded timestamps for every entity, for diagnostics.
    pub fn records(&self) -> BTreeMap<String, EntityRecord> {
        self.inner.lock().events.list_all()
    }
}

/// Tracker shared between request handlers.
pub type SharedTracker = Arc<ActivityTracker>;

/// Create a new shared tracker.
pub fn create_shared_tracker() -> SharedTracker {
    Arc::new(ActivityTracker::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::stats::WindowCounts;
    use std::thread;

    fn all(n: u64) -> WindowCounts {
        WindowCounts {
            today: n,
            week: n,
            month: n,
            year: n,
        }
    }

    #[test]
    fn test_ingest_then_query() {
        let tracker = ActivityTracker::new();
        assert!(tracker.stats("mypackage").is_none());

        let recorded = tracker.ingest("mypackage", &["install"]);
        assert_eq!(recorded, 1);

        let stats = tracker.stats("mypackage").unwrap();
        assert_eq!(stats.name, "mypackage");
        assert_eq!(stats.activities["install"], all(1));
    }

    #[test]
    fn test_separate_ingests_accumulate() {
        let tracker = ActivityTracker::new();
        tracker.ingest("pkg", &["install", "install"]);
        tracker.ingest("pkg", &["uninstall"]);

        let stats = tracker.stats("pkg").unwrap();
        assert_eq!(stats.activities["install"], all(2));
        assert_eq!(stats.activities["uninstall"], all(1));
    }

    #[test]
    fn test_empty_ingest_yields_present_but_empty_stats() {
        let tracker = ActivityTracker::new();
        let none: [&str; 0] = [];
        tracker.ingest("quiet", &none);

        let stats = tracker.stats("quiet").unwrap();
        assert!(stats.activities.is_empty());
        assert!(tracker.records().contains_key("quiet"));
    }

    #[test]
    fn test_query_does_not_recompute() {
        let tracker = ActivityTracker::new();
        let recorded_at = DateTime::parse_from_rfc3339("2020-01-01T12:00:00+00:00").unwrap();
        tracker.ingest_at("old", &["install"], recorded_at);

        // Cached as of 2020 even though the event is years old by now.
        let first = tracker.stats("old").unwrap();
        let second = tracker.stats("old").unwrap();
        assert_eq!(first.activities["install"], all(1));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&tracker.all_stats()).unwrap(),
            serde_json::to_string(&tracker.all_stats()).unwrap()
        );
    }

    #[test]
    fn test_counts_never_decrease_on_append() {
        let tracker = ActivityTracker::new();
        let mut previous = WindowCounts::default();

        for _ in 0..5 {
            tracker.ingest("pkg", &["install"]);
            let current = tracker.stats("pkg").unwrap().activities["install"];
            assert!(current.today >= previous.today);
            assert!(current.week >= previous.week);
            assert!(current.month >= previous.month);
            assert!(current.year >= previous.year);
            previous = current;
        }
        assert_eq!(previous, all(5));
    }

    #[test]
    fn test_concurrent_ingest() {
        let tracker = create_shared_tracker();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    let name = if i % 2 == 0 { "even" } else { "odd" };
                    for _ in 0..25 {
                        tracker.ingest(name, &["install"]);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = tracker.all_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["even"].activities["install"].year, 100);
        assert_eq!(stats["odd"].activities["install"].year, 100);
    }
}
