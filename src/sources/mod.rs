pub mod toggl;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::config::AdapterConfig;
use crate::error::{ConfigError, EntryError};
use crate::model::time_entry::TimeEntry;

/// Where time entries are pulled from.
#[async_trait]
pub trait TimeEntrySource: Send + Sync {
    fn name(&self) -> &str;

    /// All finished entries in `[from, till)`, in the order the service
    /// returned them. One bad record fails the whole pull.
    async fn pull(
        &self,
        from: DateTime<FixedOffset>,
        till: DateTime<FixedOffset>,
    ) -> Result<Vec<TimeEntry>, EntryError>;
}

#[cfg(test)]
mod tests;

pub fn create_source(config: &AdapterConfig) -> Result<Box<dyn TimeEntrySource>, ConfigError> {
    match config.kind.as_str() {
        toggl::KIND => Ok(Box::new(toggl::TogglTrackSource::from_config(config)?)),
        other => Err(ConfigError::UnknownKind {
            role: "source",
            kind: other.to_string(),
        }),
    }
}
