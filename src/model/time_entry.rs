use chrono::{DateTime, FixedOffset, TimeDelta};
use thiserror::Error;

use super::zone::DisplayZone;
use crate::util::fit::{fit_string, fit_tags};

const ISSUE_WIDTH: usize = 12;
const DESCRIPTION_WIDTH: usize = 30;
const TAGS_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entry must end after it starts ({from} - {till})")]
pub struct InvalidRange {
    pub from: DateTime<FixedOffset>,
    pub till: DateTime<FixedOffset>,
}

/// One block of tracked time, as pulled from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    issue: String,
    from: DateTime<FixedOffset>,
    till: DateTime<FixedOffset>,
    description: String,
    tags: Vec<String>,
}

impl TimeEntry {
    pub fn new(
        issue: impl Into<String>,
        from: DateTime<FixedOffset>,
        till: DateTime<FixedOffset>,
        description: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Self, InvalidRange> {
        if till <= from {
            return Err(InvalidRange { from, till });
        }

        Ok(Self {
            issue: issue.into(),
            from,
            till,
            description: description.into(),
            tags,
        })
    }

    pub fn issue(&self) -> &str {
        &self.issue
    }

    pub fn from(&self) -> DateTime<FixedOffset> {
        self.from
    }

    pub fn till(&self) -> DateTime<FixedOffset> {
        self.till
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn duration(&self) -> TimeDelta {
        self.till - self.from
    }

    /// Fixed-width report line: `[from - till] [issue] description [tags]`.
    pub fn render(&self, zone: &DisplayZone) -> String {
        format!(
            "[{} - {}] [{}] {} {}",
            zone.format(&self.from),
            zone.format(&self.till),
            fit_string(&self.issue, ISSUE_WIDTH),
            fit_string(&self.description, DESCRIPTION_WIDTH),
            fit_tags(self.tags.as_slice(), TAGS_WIDTH),
        )
    }
}
