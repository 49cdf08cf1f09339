//! Ordered history of custom tax rates for a single commodity
//!
//! Entries are kept in a `BTreeMap` keyed by effective timestamp, so the
//! active rate at any instant is a logarithmic "greatest key <= t" lookup.
//! Writes landing within the collapse window of an existing entry overwrite
//! that entry instead of adding a new one; lookups always use strict
//! chronological order.

use crate::error::{Result, TaxError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};

/// Check that a rate is a fraction within [0, 1]
pub fn validate_rate(rate: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(TaxError::InvalidRate { rate })
    }
}

/// A custom rate and the instant it became effective
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub effective: DateTime<Utc>,
    pub rate: f64,
}

impl RateEntry {
    pub fn new(effective: DateTime<Utc>, rate: f64) -> Self {
        Self { effective, rate }
    }
}

/// What a write did to the history
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertOutcome {
    /// A new entry was added
    Inserted,
    /// An existing entry at or before the write, within the collapse window,
    /// took the new rate. `effective` is the (unchanged) timestamp of that entry.
    Overwritten { effective: DateTime<Utc>, previous: f64 },
    /// The only colliding entry was later than the write; it was moved back
    /// to the write time and took the new rate
    Moved { from: DateTime<Utc>, previous: f64 },
}

/// Custom rates for one commodity, ordered by effective timestamp
///
/// # Example
/// ```
/// use tax_rates::history::RateHistory;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let t2 = t1 + Duration::hours(2);
///
/// let mut history = RateHistory::new(Duration::seconds(1));
/// history.insert(t1, 0.10).unwrap();
/// history.insert(t2, 0.20).unwrap();
///
/// assert_eq!(history.rate_at(t1 + Duration::hours(1)), Some(0.10));
/// assert_eq!(history.rate_at(t2), Some(0.20));
/// assert_eq!(history.rate_at(t1 - Duration::seconds(1)), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RateHistory {
    /// effective timestamp -> rate
    entries: BTreeMap<DateTime<Utc>, f64>,
    /// Writes closer than this to an existing entry overwrite it
    collapse_window: Duration,
}

impl RateHistory {
    /// Create an empty history with the given collapse window
    pub fn new(collapse_window: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            collapse_window,
        }
    }

    pub fn collapse_window(&self) -> Duration {
        self.collapse_window
    }

    /// Record `rate` as effective from `at`.
    ///
    /// A colliding entry at or before `at` takes the new rate and keeps its
    /// timestamp. A colliding entry after `at` is moved back to `at`. Either
    /// way the new rate is the one active at `at`. Otherwise a new entry is
    /// inserted.
    pub fn insert(&mut self, at: DateTime<Utc>, rate: f64) -> Result<InsertOutcome> {
        let rate = validate_rate(rate)?;

        match self.colliding_entry(at) {
            Some(effective) if effective <= at => {
                // Replacing the value of an existing key leaves the key untouched
                let previous = self.entries.insert(effective, rate).unwrap_or(rate);
                Ok(InsertOutcome::Overwritten {
                    effective,
                    previous,
                })
            }
            Some(from) => {
                let previous = self.entries.remove(&from).unwrap_or(rate);
                self.entries.insert(at, rate);
                Ok(InsertOutcome::Moved { from, previous })
            }
            None => {
                self.entries.insert(at, rate);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    /// Timestamp of the stored entry that a write at `at` would collapse into.
    ///
    /// The latest entry in `(at - window, at]` wins; failing that, the earliest
    /// entry in `(at, at + window)`. Entries stay at least one window apart, so
    /// there is never more than one candidate on each side.
    pub fn colliding_entry(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.collapse_window <= Duration::zero() {
            return self.entries.contains_key(&at).then_some(at);
        }

        let lower = at
            .checked_sub_signed(self.collapse_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let upper = at
            .checked_add_signed(self.collapse_window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let at_or_before = self
            .entries
            .range((Excluded(lower), Included(at)))
            .next_back()
            .map(|(ts, _)| *ts);
        if at_or_before.is_some() || upper <= at {
            return at_or_before;
        }

        self.entries
            .range((Excluded(at), Excluded(upper)))
            .next()
            .map(|(ts, _)| *ts)
    }

    /// Rate of the latest entry effective at or before `at`
    pub fn rate_at(&self, at: DateTime<Utc>) -> Option<f64> {
        self.entry_at(at).map(|entry| entry.rate)
    }

    /// Latest entry effective at or before `at`
    pub fn entry_at(&self, at: DateTime<Utc>) -> Option<RateEntry> {
        self.entries
            .range(..=at)
            .next_back()
            .map(|(ts, rate)| RateEntry::new(*ts, *rate))
    }

    /// Entry with the latest effective timestamp
    pub fn latest(&self) -> Option<RateEntry> {
        self.entries
            .iter()
            .next_back()
            .map(|(ts, rate)| RateEntry::new(*ts, *rate))
    }

    /// Entry with the earliest effective timestamp
    pub fn earliest(&self) -> Option<RateEntry> {
        self.entries
            .iter()
            .next()
            .map(|(ts, rate)| RateEntry::new(*ts, *rate))
    }

    /// Entries in chronological order
    pub fn iter(&self) -> impl Iterator<Item = RateEntry> + '_ {
        self.entries
            .iter()
            .map(|(ts, rate)| RateEntry::new(*ts, *rate))
    }

    pub fn entries(&self) -> Vec<RateEntry> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RateHistory {
    fn default() -> Self {
        Self::new(Duration::seconds(1))
    }
}

// Serialized as a chronological list of entries
impl Serialize for RateHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
