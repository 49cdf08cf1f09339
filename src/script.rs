//! Rate scripts: CSV files of time-stamped custom-rate writes
//!
//! Expected format (header required, `#` starts a comment line):
//!
//! ```text
//! timestamp,commodity,rate
//! 2024-01-01T10:00:00Z,transport,0.10
//! 2024-01-01T12:00:00+02:00,food,0.08
//! ```
//!
//! Replaying a script moves a [`ManualClock`] to each timestamp in file order
//! and calls [`TaxCalculator::set_custom_tax_rate`], so scripted histories go
//! through the same collapse and validation rules as live writes.

use crate::clock::ManualClock;
use crate::commodity::Commodity;
use crate::config::EngineConfig;
use crate::engine::{RateEngine, TaxCalculator};
use crate::error::{Result, TaxError};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// One scripted write
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    /// Line in the source file (1-based)
    pub line: u64,
    pub at: DateTime<Utc>,
    pub commodity: Commodity,
    pub rate: f64,
}

/// Counts from a replay
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub inserted: usize,
    pub overwritten: usize,
    /// Clock time after the last step
    pub last_time: Option<DateTime<Utc>>,
}

/// Parse a rate script. Rates are not range-checked here; the engine does
/// that during replay.
pub fn load_script<R: Read>(reader: R) -> Result<Vec<ScriptStep>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let ts_idx = find_column(&headers, "timestamp")?;
    let commodity_idx = find_column(&headers, "commodity")?;
    let rate_idx = find_column(&headers, "rate")?;

    let mut steps = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let at_line = |e: TaxError| TaxError::Script {
            line,
            source: Box::new(e),
        };

        let ts = field(&record, ts_idx, "timestamp").map_err(at_line)?;
        let at = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| at_line(TaxError::Parse(format!("Invalid timestamp '{}': {}", ts, e))))?
            .with_timezone(&Utc);

        let commodity: Commodity = field(&record, commodity_idx, "commodity")
            .and_then(|s| s.parse::<Commodity>())
            .map_err(at_line)?;

        let rate_str = field(&record, rate_idx, "rate").map_err(at_line)?;
        let rate: f64 = rate_str
            .parse()
            .map_err(|_| at_line(TaxError::Parse(format!("Invalid rate '{}'", rate_str))))?;

        steps.push(ScriptStep {
            line,
            at,
            commodity,
            rate,
        });
    }

    Ok(steps)
}

/// Load a rate script from a file
pub fn load_script_file(path: &Path) -> Result<Vec<ScriptStep>> {
    let file = std::fs::File::open(path)?;
    load_script(file)
}

/// Apply `steps` to `engine`, which must be driven by `clock`.
///
/// Stops at the first rejected rate; steps before it stay applied.
pub fn replay(
    steps: &[ScriptStep],
    clock: &ManualClock,
    engine: &mut RateEngine,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for step in steps {
        clock.set(step.at);
        let before = engine.entry_count();
        engine
            .set_custom_tax_rate(step.commodity, step.rate)
            .map_err(|e| TaxError::Script {
                line: step.line,
                source: Box::new(e),
            })?;

        if engine.entry_count() > before {
            summary.inserted += 1;
        } else {
            summary.overwritten += 1;
        }
        summary.steps += 1;
        summary.last_time = Some(step.at);
    }

    log::debug!(
        "Replayed {} steps ({} inserted, {} overwritten)",
        summary.steps,
        summary.inserted,
        summary.overwritten
    );

    Ok(summary)
}

/// Build a fresh engine on a manual clock and replay `steps` into it
pub fn engine_from_script(
    steps: &[ScriptStep],
    config: EngineConfig,
) -> Result<(RateEngine, ManualClock, ReplaySummary)> {
    let start = steps.first().map(|s| s.at).unwrap_or_else(Utc::now);
    let clock = ManualClock::new(start);
    let mut engine = RateEngine::with_config(config, clock.clone())?;
    let summary = replay(steps, &clock, &mut engine)?;
    Ok((engine, clock, summary))
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TaxError::Parse(format!("Missing {}", name)))
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| TaxError::Parse(format!("Column '{}' not found", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use chrono::{Duration, TimeZone};

    const SCRIPT: &str = "\
timestamp,commodity,rate
# the last two transport writes land in one collapse window
2024-01-01T10:00:00Z,transport,0.10
2024-01-01T12:00:00+02:00,food,0.08
2024-01-01T12:00:00Z,transport,0.20
2024-01-01T12:00:00.500Z,transport,0.30
";

    #[test]
    fn test_load_script() {
        let steps = load_script(SCRIPT.as_bytes()).unwrap();
        assert_eq!(steps.len(), 4);

        assert_eq!(steps[0].commodity, Commodity::Transport);
        assert_eq!(steps[0].at, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(steps[1].at, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(steps[1].rate, 0.08);
        assert!(steps[0].line < steps[1].line);
    }

    #[test]
    fn test_replay_collapses_close_writes() {
        let steps = load_script(SCRIPT.as_bytes()).unwrap();
        let (engine, clock, summary) = engine_from_script(&steps, EngineConfig::default()).unwrap();

        assert_eq!(summary.steps, 4);
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.overwritten, 1);
        assert_eq!(summary.last_time, Some(steps[3].at));
        assert_eq!(clock.now(), steps[3].at);

        let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(engine.get_tax_rate_for_date_time(Commodity::Transport, noon), 0.30);
        assert_eq!(
            engine.get_tax_rate_for_date_time(Commodity::Transport, noon - Duration::minutes(1)),
            0.10
        );
        assert_eq!(engine.get_current_tax_rate(Commodity::Food), 0.08);
    }

    #[test]
    fn test_replay_reports_line_of_invalid_rate() {
        let script = "timestamp,commodity,rate\n\
                      2024-01-01T10:00:00Z,food,0.05\n\
                      2024-01-01T11:00:00Z,food,1.50\n";
        let steps = load_script(script.as_bytes()).unwrap();
        let err = engine_from_script(&steps, EngineConfig::default()).unwrap_err();

        assert!(err.is_invalid_rate());
        assert!(matches!(err, TaxError::Script { line: 3, .. }));
    }

    #[test]
    fn test_load_script_errors() {
        let missing_column = "timestamp,commodity\n2024-01-01T10:00:00Z,food\n";
        assert!(matches!(
            load_script(missing_column.as_bytes()),
            Err(TaxError::Parse(_))
        ));

        let bad_time = "timestamp,commodity,rate\nyesterday,food,0.1\n";
        assert!(matches!(
            load_script(bad_time.as_bytes()),
            Err(TaxError::Script { line: 2, .. })
        ));

        let bad_commodity = "timestamp,commodity,rate\n2024-01-01T10:00:00Z,tobacco,0.1\n";
        let err = load_script(bad_commodity.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("tobacco"));

        let bad_rate = "timestamp,commodity,rate\n2024-01-01T10:00:00Z,food,lots\n";
        assert!(load_script(bad_rate.as_bytes()).is_err());
    }

    #[test]
    fn test_load_script_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();

        let steps = load_script_file(file.path()).unwrap();
        assert_eq!(steps.len(), 4);
    }
}
