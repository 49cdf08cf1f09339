//! Rate engine: standard rates overridden by time-stamped custom rates
//!
//! Each engine owns its custom-rate histories exclusively. Two engines never
//! observe each other's custom rates; run one engine per customer or session
//! and wrap it in [`crate::shared::SharedRateEngine`] when it must be shared.

use crate::clock::{Clock, SystemClock};
use crate::commodity::Commodity;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history::{validate_rate, InsertOutcome, RateEntry, RateHistory};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Client-facing tax-rate operations
pub trait TaxCalculator {
    /// Standard (hard-coded) rate for a commodity
    fn get_standard_tax_rate(&self, commodity: Commodity) -> f64 {
        commodity.standard_rate()
    }

    /// Record a custom rate effective from the clock's current time.
    ///
    /// Fails with [`crate::error::TaxError::InvalidRate`] when `rate` is
    /// outside [0, 1]; nothing is recorded in that case.
    fn set_custom_tax_rate(&mut self, commodity: Commodity, rate: f64) -> Result<()>;

    /// Rate active at `date`: the latest custom rate effective at or before
    /// it, or the standard rate when there is none
    fn get_tax_rate_for_date_time<Tz: TimeZone>(&self, commodity: Commodity, date: DateTime<Tz>)
        -> f64;

    /// Rate active at the clock's current time
    fn get_current_tax_rate(&self, commodity: Commodity) -> f64;
}

/// Standard rate plus every custom rate recorded for one commodity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSchedule {
    pub commodity: Commodity,
    pub standard_rate: f64,
    pub entries: Vec<RateEntry>,
}

/// In-memory tax-rate engine
///
/// # Example
/// ```
/// use tax_rates::prelude::*;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let clock = ManualClock::new(start);
/// let mut engine = RateEngine::with_clock(clock.clone());
///
/// engine.set_custom_tax_rate(Commodity::Food, 0.10).unwrap();
/// clock.advance(Duration::hours(1));
///
/// assert_eq!(engine.get_current_tax_rate(Commodity::Food), 0.10);
/// assert_eq!(
///     engine.get_tax_rate_for_date_time(Commodity::Food, start - Duration::hours(1)),
///     0.12
/// );
/// ```
pub struct RateEngine {
    /// Custom-rate histories, created on first write per commodity
    histories: HashMap<Commodity, RateHistory>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

impl RateEngine {
    /// Create an engine driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an engine driven by the given clock
    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self {
            histories: HashMap::new(),
            clock: Box::new(clock),
            config: EngineConfig::default(),
        }
    }

    /// Create with configuration
    pub fn with_config<C: Clock + 'static>(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            histories: HashMap::new(),
            clock: Box::new(clock),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current time according to the engine's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Custom-rate history of a commodity, if any custom rate was ever set
    pub fn history(&self, commodity: Commodity) -> Option<&RateHistory> {
        self.histories.get(&commodity)
    }

    /// Commodities with at least one custom rate, in declaration order
    pub fn custom_commodities(&self) -> Vec<Commodity> {
        Commodity::ALL
            .into_iter()
            .filter(|c| self.histories.contains_key(c))
            .collect()
    }

    /// Total number of custom-rate entries across all commodities
    pub fn entry_count(&self) -> usize {
        self.histories.values().map(RateHistory::len).sum()
    }

    pub fn rate_schedule(&self, commodity: Commodity) -> RateSchedule {
        RateSchedule {
            commodity,
            standard_rate: commodity.standard_rate(),
            entries: self
                .histories
                .get(&commodity)
                .map(RateHistory::entries)
                .unwrap_or_default(),
        }
    }

    fn rate_at(&self, commodity: Commodity, at: DateTime<Utc>) -> f64 {
        self.histories
            .get(&commodity)
            .and_then(|history| history.rate_at(at))
            .unwrap_or_else(|| commodity.standard_rate())
    }
}

impl Default for RateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateEngine")
            .field("histories", &self.histories)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TaxCalculator for RateEngine {
    fn set_custom_tax_rate(&mut self, commodity: Commodity, rate: f64) -> Result<()> {
        if let Err(e) = validate_rate(rate) {
            log::warn!("Rejected custom rate for {}: {}", commodity, e);
            return Err(e);
        }

        let now = self.clock.now();
        let window = self.config.collapse_window();
        let outcome = self
            .histories
            .entry(commodity)
            .or_insert_with(|| RateHistory::new(window))
            .insert(now, rate)?;

        match outcome {
            InsertOutcome::Inserted => {
                log::debug!("Custom rate {} for {} effective from {}", rate, commodity, now);
            }
            InsertOutcome::Overwritten {
                effective,
                previous,
            } => {
                log::debug!(
                    "Custom rate for {} at {} overwritten: {} -> {} (write at {})",
                    commodity,
                    effective,
                    previous,
                    rate,
                    now
                );
            }
            InsertOutcome::Moved { from, previous } => {
                log::debug!(
                    "Custom rate for {} moved back from {} to {}: {} -> {}",
                    commodity,
                    from,
                    now,
                    previous,
                    rate
                );
            }
        }

        Ok(())
    }

    fn get_tax_rate_for_date_time<Tz: TimeZone>(
        &self,
        commodity: Commodity,
        date: DateTime<Tz>,
    ) -> f64 {
        self.rate_at(commodity, date.with_timezone(&Utc))
    }

    fn get_current_tax_rate(&self, commodity: Commodity) -> f64 {
        self.rate_at(commodity, self.clock.now())
    }
}
