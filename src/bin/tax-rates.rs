//! tax-rates CLI - inspect standard rates and replay custom-rate scripts
//!
//! ## Example Usage
//!
//! ```bash
//! # Standard rate table
//! tax-rates standard
//!
//! # Rate for transport at a point in time, after replaying a script
//! tax-rates query --script rates.csv --commodity transport --at 2024-01-01T11:00:00Z
//!
//! # Same query with a local wall-clock time
//! tax-rates query --script rates.csv --commodity transport \
//!     --at "2024-01-01 12:00:00" --tz Europe/Stockholm
//!
//! # Full schedule as JSON
//! tax-rates schedule --script rates.csv --json
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;
use tax_rates::prelude::*;
use tax_rates::script::{engine_from_script, load_script_file, ReplaySummary};

/// tax-rates: per-commodity tax-rate resolution
#[derive(Parser)]
#[command(name = "tax-rates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve standard and custom tax rates per commodity", long_about = None)]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the standard rate table, or one commodity's standard rate
    Standard {
        /// Commodity name (e.g. food, cultural_services)
        #[arg(value_name = "COMMODITY")]
        commodity: Option<String>,
    },

    /// Replay a rate script and resolve one commodity's rate at a point in time
    Query {
        /// Rate script (CSV: timestamp,commodity,rate)
        #[arg(short = 's', long)]
        script: PathBuf,

        /// Commodity to resolve
        #[arg(short = 'm', long)]
        commodity: String,

        /// Point in time: RFC 3339, or "YYYY-MM-DD HH:MM:SS" in --tz
        /// (default: time of the last scripted write)
        #[arg(short = 'a', long)]
        at: Option<String>,

        /// Time zone for a --at without offset (IANA name)
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Replay a rate script and print the resulting schedules
    Schedule {
        /// Rate script (CSV: timestamp,commodity,rate)
        #[arg(short = 's', long)]
        script: PathBuf,

        /// Only print this commodity
        #[arg(short = 'm', long)]
        commodity: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Standard { commodity } => show_standard(commodity.as_deref()),
        Commands::Query {
            script,
            commodity,
            at,
            tz,
        } => run_query(&config, &script, &commodity, at.as_deref(), &tz, cli.verbose),
        Commands::Schedule {
            script,
            commodity,
            json,
        } => show_schedule(&config, &script, commodity.as_deref(), json),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn parse_commodity(name: &str) -> Result<Commodity> {
    Ok(name.parse::<Commodity>()?)
}

/// Parse RFC 3339, falling back to a naive wall-clock time in `tz`
fn parse_point_in_time(s: &str, tz: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let zone: Tz = tz
        .parse()
        .map_err(|e| anyhow!("Unknown time zone '{}': {}", tz, e))?;
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Invalid point in time '{}'", s))?;

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("'{}' does not exist in {}", s, zone))
}

fn replay_script(config: &EngineConfig, script: &Path) -> Result<(RateEngine, ReplaySummary)> {
    let steps = load_script_file(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let (engine, _clock, summary) = engine_from_script(&steps, *config)?;
    Ok((engine, summary))
}

fn show_standard(commodity: Option<&str>) -> Result<()> {
    match commodity {
        Some(name) => {
            let commodity = parse_commodity(name)?;
            println!("{}", format_rate(commodity.standard_rate()));
        }
        None => {
            println!("{}", "Standard Rates".cyan().bold());
            println!("{}", "==============".cyan());
            for commodity in Commodity::ALL {
                println!(
                    "  {:<20} {}",
                    commodity.as_str().bold(),
                    format_rate(commodity.standard_rate())
                );
            }
        }
    }
    Ok(())
}

fn run_query(
    config: &EngineConfig,
    script: &Path,
    commodity: &str,
    at: Option<&str>,
    tz: &str,
    verbose: bool,
) -> Result<()> {
    let commodity = parse_commodity(commodity)?;
    let (engine, summary) = replay_script(config, script)?;

    let at = match at {
        Some(s) => parse_point_in_time(s, tz)?,
        None => summary.last_time.unwrap_or_else(|| engine.now()),
    };

    if verbose {
        println!(
            "  {} {} steps ({} inserted, {} overwritten)",
            "Replayed:".bold(),
            summary.steps,
            summary.inserted,
            summary.overwritten
        );
        println!("  {} {}", "At:".bold(), at.to_rfc3339());
    }

    let rate = engine.get_tax_rate_for_date_time(commodity, at);
    let source = if rate_is_custom(&engine, commodity, at) {
        "custom".yellow()
    } else {
        "standard".dimmed()
    };
    println!("{} {} ({})", commodity.as_str().bold(), format_rate(rate), source);

    Ok(())
}

fn rate_is_custom(engine: &RateEngine, commodity: Commodity, at: DateTime<Utc>) -> bool {
    engine
        .history(commodity)
        .and_then(|history| history.entry_at(at))
        .is_some()
}

fn show_schedule(
    config: &EngineConfig,
    script: &Path,
    commodity: Option<&str>,
    json: bool,
) -> Result<()> {
    let (engine, _) = replay_script(config, script)?;

    let commodities = match commodity {
        Some(name) => vec![parse_commodity(name)?],
        None => engine.custom_commodities(),
    };
    let schedules: Vec<RateSchedule> = commodities
        .into_iter()
        .map(|c| engine.rate_schedule(c))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&schedules)?);
        return Ok(());
    }

    for schedule in &schedules {
        println!(
            "{} (standard {})",
            schedule.commodity.as_str().cyan().bold(),
            format_rate(schedule.standard_rate)
        );
        if schedule.entries.is_empty() {
            println!("  {}", "no custom rates".dimmed());
        }
        for entry in &schedule.entries {
            println!("  {}  {}", entry.effective.to_rfc3339(), format_rate(entry.rate));
        }
    }

    Ok(())
}

fn format_rate(rate: f64) -> String {
    format!("{:.4} ({:.2}%)", rate, rate * 100.0)
}
