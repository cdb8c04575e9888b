use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use clap::{Args, Parser, Subcommand};

use crate::config::{self, AppConfig};
use crate::model::zone::DisplayZone;
use crate::sources;
use crate::sync::{self, SyncOptions, SyncWindow};
use crate::targets;

#[derive(Debug, Parser)]
#[command(name = "timesheets")]
#[command(about = "Synchronize your work logs between timesheet managing systems", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/timesheets/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log requests and decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synchronize your work logs
    ///
    /// Example (work logs of 2025-06-01 and 2025-06-02):
    ///
    ///   timesheets sync --from 2025-06-01 --till 2025-06-03
    Sync(SyncArgs),

    /// Print the used configuration
    Config,

    /// Print version information
    Version,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Date or date-time to sync work logs from (inclusive), defaults to today
    #[arg(long)]
    pub from: Option<TimeArg>,

    /// Date or date-time to sync work logs till (exclusive), defaults to tomorrow
    #[arg(long)]
    pub till: Option<TimeArg>,

    /// Stop the synchronization on the first error encountered
    #[arg(long)]
    pub bail: bool,

    /// Perform a dry run without making any changes
    #[arg(long)]
    pub dry: bool,
}

/// A `--from`/`--till` literal. Dates and offset-less date-times are read
/// in the local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeArg {
    Date(NaiveDate),
    Local(NaiveDateTime),
    Absolute(DateTime<FixedOffset>),
}

impl FromStr for TimeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(TimeArg::Date(date));
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
            return Ok(TimeArg::Absolute(instant));
        }
        if let Ok(local) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(TimeArg::Local(local));
        }
        Err(format!(
            "cannot parse \"{s}\", expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or an RFC 3339 timestamp"
        ))
    }
}

impl TimeArg {
    fn resolve<Tz: TimeZone>(self, zone: &Tz) -> Result<DateTime<FixedOffset>> {
        match self {
            TimeArg::Date(date) => local_instant(zone, date.and_time(NaiveTime::MIN)),
            TimeArg::Local(naive) => local_instant(zone, naive),
            TimeArg::Absolute(instant) => Ok(instant),
        }
    }
}

fn local_instant<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .with_context(|| format!("{naive} does not exist in the local timezone"))
}

/// Resolve the sync window. Missing bounds default to today 00:00 and
/// tomorrow 00:00 in the zone of `now`.
pub fn resolve_window<Tz: TimeZone>(
    from: Option<TimeArg>,
    till: Option<TimeArg>,
    now: &DateTime<Tz>,
) -> Result<SyncWindow> {
    let zone = now.timezone();
    let today = now.date_naive();
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .context("date out of range")?;

    let from = from.unwrap_or(TimeArg::Date(today)).resolve(&zone)?;
    let till = till.unwrap_or(TimeArg::Date(tomorrow)).resolve(&zone)?;

    if from >= till {
        bail!("--from ({from}) must be before --till ({till})");
    }

    Ok(SyncWindow { from, till })
}

pub async fn handle_sync<Tz: TimeZone>(
    config: &AppConfig,
    args: &SyncArgs,
    now: &DateTime<Tz>,
) -> Result<u8> {
    let source =
        sources::create_source(&config.source).context("error creating time entry source")?;
    let target =
        targets::create_target(&config.target).context("error creating time entry target")?;
    let zone =
        DisplayZone::parse(config.timezone.as_deref()).context("error creating timezone")?;
    let window = resolve_window(args.from, args.till, now)?;

    let options = SyncOptions {
        bail: args.bail,
        dry: args.dry,
    };

    let mut stdout = std::io::stdout().lock();
    let report = sync::run(source.as_ref(), target.as_ref(), &window, options, &zone, &mut stdout).await?;
    Ok(report.exit_code())
}

pub fn handle_config(config: &AppConfig) -> Result<()> {
    print!("{}", config::render_config(config)?);
    Ok(())
}

pub fn print_version() {
    print!("{}", version_info());
}

fn version_info() -> String {
    format!(
        "timesheets {}\nplatform:  {}/{}\n",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}
