use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::model::zone::DisplayZone;
use crate::sources::TimeEntrySource;
use crate::targets::TimeEntryTarget;

/// Half-open interval `[from, till)` to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub from: DateTime<FixedOffset>,
    pub till: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Stop at the first failed push.
    pub bail: bool,
    /// Pull and report only, never push.
    pub dry: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pulled: usize,
    pub pushed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bailed: bool,
}

impl SyncReport {
    /// `0` clean, `1` aborted by bail mode, `2` finished with failures.
    pub fn exit_code(&self) -> u8 {
        if self.bailed {
            1
        } else if self.failed > 0 {
            2
        } else {
            0
        }
    }
}

/// Pull every entry in `window` and push them one by one, writing one
/// report line per entry to `out` in pull order.
pub async fn run<W: Write>(
    source: &dyn TimeEntrySource,
    target: &dyn TimeEntryTarget,
    window: &SyncWindow,
    options: SyncOptions,
    zone: &DisplayZone,
    out: &mut W,
) -> Result<SyncReport> {
    let entries = source
        .pull(window.from, window.till)
        .await
        .with_context(|| format!("error pulling time entries from {}", source.name()))?;

    let mut report = SyncReport {
        pulled: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        write!(out, "{}", entry.render(zone))?;
        out.flush()?;

        if options.dry {
            writeln!(out, " -")?;
            report.skipped += 1;
            continue;
        }

        match target.push(entry).await {
            Ok(()) => {
                writeln!(out, " ✔")?;
                report.pushed += 1;
            }
            Err(err) => {
                let status = err.status().map(|s| s.as_u16());
                let err = anyhow::Error::new(err);
                writeln!(out, " ✘ {err:#}")?;
                warn!(issue = entry.issue(), ?status, "push to {} failed: {err:#}", target.name());
                report.failed += 1;

                if options.bail {
                    report.bailed = true;
                    break;
                }
            }
        }
    }

    info!(
        pulled = report.pulled,
        pushed = report.pushed,
        failed = report.failed,
        skipped = report.skipped,
        bailed = report.bailed,
        "sync finished"
    );
    Ok(report)
}
