//! Custom rate history example

use chrono::{Duration, TimeZone, Utc};
use tax_rates::prelude::*;

fn main() {
    env_logger::init();

    println!("=== tax_rates: Custom Rate History Example ===\n");

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let mut engine = RateEngine::with_clock(clock.clone());

    // Transport is discounted at 08:00, then raised again at 10:00
    engine
        .set_custom_tax_rate(Commodity::Transport, 0.10)
        .expect("0.10 is a valid rate");
    clock.advance(Duration::hours(2));
    engine
        .set_custom_tax_rate(Commodity::Transport, 0.20)
        .expect("0.20 is a valid rate");

    // A second write within the same second replaces the 10:00 rate
    clock.advance(Duration::milliseconds(300));
    engine
        .set_custom_tax_rate(Commodity::Transport, 0.25)
        .expect("0.25 is a valid rate");

    if let Err(e) = engine.set_custom_tax_rate(Commodity::Transport, 1.5) {
        println!("Rejected: {}\n", e);
    }

    println!("Transport schedule:");
    for entry in engine.rate_schedule(Commodity::Transport).entries {
        println!("  {}  {:.2}", entry.effective.to_rfc3339(), entry.rate);
    }

    println!("\nResolved rates:");
    for offset in [-1i64, 0, 1, 2, 3] {
        let at = start + Duration::hours(offset);
        println!(
            "  {}  transport {:.2}  food {:.2}",
            at.to_rfc3339(),
            engine.get_tax_rate_for_date_time(Commodity::Transport, at),
            engine.get_tax_rate_for_date_time(Commodity::Food, at)
        );
    }

    println!(
        "\nCurrent transport rate: {:.2}",
        engine.get_current_tax_rate(Commodity::Transport)
    );
}
