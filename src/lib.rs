//! # tax_rates
//!
//! Per-commodity tax-rate resolution.
//!
//! Every [`Commodity`](commodity::Commodity) has a fixed standard rate. Clients
//! may override it at runtime with custom rates; each custom rate becomes
//! effective at the instant it is set and stays active until a later one
//! supersedes it. The engine answers "which rate applied to this commodity at
//! that time" and "which rate applies now".
//!
//! ## Example
//!
//! ```rust
//! use tax_rates::prelude::*;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
//! let clock = ManualClock::new(now - Duration::hours(2));
//! let mut engine = RateEngine::with_clock(clock.clone());
//!
//! engine.set_custom_tax_rate(Commodity::Transport, 0.1).unwrap();
//! clock.set(now);
//! engine.set_custom_tax_rate(Commodity::Transport, 0.2).unwrap();
//!
//! let earlier = now - Duration::minutes(57);
//! assert_eq!(engine.get_tax_rate_for_date_time(Commodity::Transport, earlier), 0.1);
//! assert_eq!(engine.get_current_tax_rate(Commodity::Transport), 0.2);
//! assert_eq!(engine.get_current_tax_rate(Commodity::Food), 0.12);
//! ```

pub mod clock;
pub mod commodity;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod script;
pub mod shared;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::commodity::Commodity;
    pub use crate::config::EngineConfig;
    pub use crate::engine::{RateEngine, RateSchedule, TaxCalculator};
    pub use crate::error::{Result, TaxError};
    pub use crate::history::{RateEntry, RateHistory};
    pub use crate::shared::SharedRateEngine;
}
