//! Rolling window counts derived from recorded activity.
//!
//! Counts are recomputed from every stored timestamp of an entity and cached
//! in a [`StatsRegistry`] until the next recomputation. Windows are anchored to
//! the instant of recomputation, so cached counts describe that instant only.

use crate::store::event_store::EventStore;
use chrono::{DateTime, Days, FixedOffset, Local, Months, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event counts for one activity kind across the four rolling windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WindowCounts {
    pub today: u64,
    pub week: u64,
    pub month: u64,
    pub year: u64,
}

/// Cached window counts for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityStats {
    /// Entity name
    pub name: String,
    /// Activity kind -> counts as of the last recomputation
    pub activities: BTreeMap<String, WindowCounts>,
}

impl EntityStats {
    /// Create empty stats for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: BTreeMap::new(),
        }
    }
}

/// A stored timestamp that could not be parsed back.
#[derive(Debug, Clone)]
pub struct TimestampParseError {
    pub raw: String,
    pub reason: String,
}

impl std::fmt::Display for TimestampParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid timestamp {:?}: {}", self.raw, self.reason)
    }
}

impl std::error::Error for TimestampParseError {}

/// Parse a stored timestamp, keeping its recorded offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TimestampParseError> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| TimestampParseError {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Window boundaries evaluated once per recomputation.
#[derive(Debug, Clone, Copy)]
pub struct WindowThresholds {
    now: DateTime<FixedOffset>,
    week: Option<DateTime<FixedOffset>>,
    month: Option<DateTime<FixedOffset>>,
    year: Option<DateTime<FixedOffset>>,
}

impl WindowThresholds {
    /// Compute thresholds anchored at `now` using calendar arithmetic.
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            now,
            week: now.checked_sub_days(Days::new(7)),
            month: now.checked_sub_months(Months::new(1)),
            year: now.checked_sub_months(Months::new(12)),
        }
    }

    /// `t` is at or after midnight of the current day in `t`'s own offset.
    pub fn is_today(&self, t: &DateTime<FixedOffset>) -> bool {
        let offset = *t.offset();
        let midnight = self
            .now
            .with_timezone(&offset)
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| offset.from_local_datetime(&naive).single());

        match midnight {
            Some(midnight) => *t >= midnight,
            None => false,
        }
    }

    /// `t` is after now minus seven days.
    pub fn is_this_week(&self, t: &DateTime<FixedOffset>) -> bool {
        Self::is_after(t, self.week)
    }

    /// `t` is after now minus one calendar month.
    pub fn is_this_month(&self, t: &DateTime<FixedOffset>) -> bool {
        Self::is_after(t, self.month)
    }

    /// `t` is after now minus one calendar year.
    pub fn is_this_year(&self, t: &DateTime<FixedOffset>) -> bool {
        Self::is_after(t, self.year)
    }

    // An unrepresentable threshold lies before every valid timestamp.
    fn is_after(t: &DateTime<FixedOffset>, threshold: Option<DateTime<FixedOffset>>) -> bool {
        threshold.map_or(true, |threshold| *t > threshold)
    }

    /// Classify every timestamp in `stamps` into the four windows.
    ///
    /// Unparseable timestamps are logged and count toward nothing.
    pub fn count<S: AsRef<str>>(&self, stamps: &[S]) -> WindowCounts {
        let mut counts = WindowCounts::default();

        for raw in stamps {
            let t = match parse_timestamp(raw.as_ref()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Skipping timestamp: {}", e);
                    continue;
                }
            };

            if self.is_today(&t) {
                counts.today += 1;
            }
            if self.is_this_week(&t) {
                counts.week += 1;
            }
            if self.is_this_month(&t) {
                counts.month += 1;
            }
            if self.is_this_year(&t) {
                counts.year += 1;
            }
        }

        counts
    }
}

/// Registry of cached entity stats keyed by name.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    stats: BTreeMap<String, EntityStats>,
}

impl StatsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached stats for `name`, if any were ever computed.
    pub fn get(&self, name: &str) -> Option<&EntityStats> {
        self.stats.get(name)
    }

    /// Snapshot of all cached stats.
    pub fn list_all(&self) -> BTreeMap<String, EntityStats> {
        self.stats.clone()
    }

    /// Recompute `name`'s counts against the current wall-clock time.
    pub fn recompute(&mut self, events: &EventStore, name: &str) -> &EntityStats {
        self.recompute_at(events, name, Local::now().into())
    }

    /// Recompute `name`'s counts against `now`.
    ///
    /// Only kinds present in the event store are overwritten; kinds cached by
    /// an earlier recomputation but no longer recorded are left untouched.
    /// O(total timestamps recorded for `name`).
    pub fn recompute_at(
        &mut self,
        events: &EventStore,
        name: &str,
        now: DateTime<FixedOffset>,
    ) -> &EntityStats {
        let stats = self
            .stats
            .entry(name.to_string())
            .or_insert_with(|| EntityStats::new(name));

        if let Some(record) = events.get(name) {
            let thresholds = WindowThresholds::at(now);
            for (kind, stamps) in &record.activities {
                stats
                    .activities
                    .insert(kind.clone(), thresholds.count(stamps));
            }
        }

        stats
    }

    /// Number of entities with cached stats.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether no stats have been computed yet.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
