//! Raw activity timestamps recorded per entity.
//!
//! Each entity ("thing") owns a list of timestamps per activity kind.
//! Timestamps are kept as RFC 3339 strings in recording order and are only
//! interpreted when stats are recomputed.

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recorded activity for a single named entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityRecord {
    /// Entity name
    pub name: String,
    /// Activity kind -> timestamps in the order they were recorded
    pub activities: BTreeMap<String, Vec<String>>,
}

impl EntityRecord {
    /// Create an empty record for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: BTreeMap::new(),
        }
    }

    /// Append one timestamp per entry in `kinds`, all stamped with `at`.
    ///
    /// Duplicate kinds are meaningful: each occurrence is a separate event.
    pub fn add_activities<S: AsRef<str>>(&mut self, kinds: &[S], at: DateTime<FixedOffset>) {
        let stamp = format_timestamp(at);
        for kind in kinds {
            self.activities
                .entry(kind.as_ref().to_string())
                .or_default()
                .push(stamp.clone());
        }
    }

    /// Total number of timestamps across all kinds.
    pub fn event_count(&self) -> usize {
        self.activities.values().map(Vec::len).sum()
    }
}

/// Registry of entity records keyed by name.
#[derive(Debug, Default)]
pub struct EventStore {
    records: BTreeMap<String, EntityRecord>,
}

impl EventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record for `name`, registering an empty one if absent.
    pub fn get_or_create(&mut self, name: &str) -> &mut EntityRecord {
        self.records
            .entry(name.to_string())
            .or_insert_with(|| EntityRecord::new(name))
    }

    /// Look up a record without creating it.
    pub fn get(&self, name: &str) -> Option<&EntityRecord> {
        self.records.get(name)
    }

    /// Record one event per entry in `kinds` at the current wall-clock time.
    pub fn record_activities<S: AsRef<str>>(&mut self, name: &str, kinds: &[S]) {
        self.record_activities_at(name, kinds, Local::now().into());
    }

    /// Record one event per entry in `kinds` at the given instant.
    ///
    /// An empty `kinds` slice still materializes the record.
    pub fn record_activities_at<S: AsRef<str>>(
        &mut self,
        name: &str,
        kinds: &[S],
        at: DateTime<FixedOffset>,
    ) {
        self.get_or_create(name).add_activities(kinds, at);
    }

    /// Snapshot of every record, for diagnostics.
    pub fn list_all(&self) -> BTreeMap<String, EntityRecord> {
        self.records.clone()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no entity has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Format an instant the way it is stored: whole seconds, explicit offset.
pub fn format_timestamp(at: DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}
