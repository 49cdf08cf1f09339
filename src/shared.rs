//! Thread-safe handle around a [`RateEngine`]
//!
//! A write reads the clock, looks for a colliding entry and then inserts or
//! overwrites. That sequence runs under one lock acquisition, so concurrent
//! writers landing in the same collapse window cannot both insert.

use crate::commodity::Commodity;
use crate::engine::{RateSchedule, RateEngine, TaxCalculator};
use crate::error::Result;
use chrono::{DateTime, TimeZone};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable, lock-guarded rate engine. Clones share the same histories.
#[derive(Debug, Clone)]
pub struct SharedRateEngine {
    inner: Arc<Mutex<RateEngine>>,
}

impl SharedRateEngine {
    pub fn new(engine: RateEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // Every mutation is a single map operation, so a poisoned engine is
    // still consistent
    fn lock(&self) -> MutexGuard<'_, RateEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Same as [`TaxCalculator::set_custom_tax_rate`], callable through a shared reference
    pub fn set_rate(&self, commodity: Commodity, rate: f64) -> Result<()> {
        self.lock().set_custom_tax_rate(commodity, rate)
    }

    pub fn rate_at<Tz: TimeZone>(&self, commodity: Commodity, date: DateTime<Tz>) -> f64 {
        self.lock().get_tax_rate_for_date_time(commodity, date)
    }

    pub fn current_rate(&self, commodity: Commodity) -> f64 {
        self.lock().get_current_tax_rate(commodity)
    }

    pub fn rate_schedule(&self, commodity: Commodity) -> RateSchedule {
        self.lock().rate_schedule(commodity)
    }

    pub fn entry_count(&self) -> usize {
        self.lock().entry_count()
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut RateEngine) -> R) -> R {
        f(&mut *self.lock())
    }
}

impl From<RateEngine> for SharedRateEngine {
    fn from(engine: RateEngine) -> Self {
        Self::new(engine)
    }
}

impl TaxCalculator for SharedRateEngine {
    fn set_custom_tax_rate(&mut self, commodity: Commodity, rate: f64) -> Result<()> {
        self.set_rate(commodity, rate)
    }

    fn get_tax_rate_for_date_time<Tz: TimeZone>(
        &self,
        commodity: Commodity,
        date: DateTime<Tz>,
    ) -> f64 {
        self.rate_at(commodity, date)
    }

    fn get_current_tax_rate(&self, commodity: Commodity) -> f64 {
        self.current_rate(commodity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let shared = SharedRateEngine::new(RateEngine::with_clock(clock));
        let other = shared.clone();

        shared.set_rate(Commodity::Literature, 0.05).unwrap();
        assert_eq!(other.current_rate(Commodity::Literature), 0.05);
        assert_eq!(other.get_standard_tax_rate(Commodity::Literature), 0.60);
    }

    #[test]
    fn test_concurrent_writes_in_one_window_collapse() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let shared = SharedRateEngine::new(RateEngine::with_clock(clock));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = shared.clone();
                thread::spawn(move || engine.set_rate(Commodity::Food, i as f64 / 10.0))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(shared.entry_count(), 1);
        let rate = shared.current_rate(Commodity::Food);
        assert!((0.0..=0.7).contains(&rate));
    }

    #[test]
    fn test_concurrent_writes_at_distinct_times() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let shared = SharedRateEngine::new(RateEngine::with_clock(clock.clone()));

        for i in 0..4 {
            clock.set(start + Duration::minutes(i));
            let engine = shared.clone();
            thread::spawn(move || engine.set_rate(Commodity::Transport, 0.1))
                .join()
                .unwrap()
                .unwrap();
        }

        assert_eq!(shared.rate_schedule(Commodity::Transport).entries.len(), 4);
        assert_eq!(
            shared.with_engine(|engine| engine.custom_commodities()),
            vec![Commodity::Transport]
        );
    }

    #[test]
    fn test_trait_surface() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut shared: SharedRateEngine = RateEngine::with_clock(ManualClock::new(start)).into();

        shared.set_custom_tax_rate(Commodity::Alcohol, 0.3).unwrap();
        assert!(shared.set_custom_tax_rate(Commodity::Alcohol, 2.0).is_err());
        assert_eq!(shared.get_current_tax_rate(Commodity::Alcohol), 0.3);
        assert_eq!(
            shared.get_tax_rate_for_date_time(Commodity::Alcohol, start - Duration::seconds(1)),
            0.25
        );
    }
}
