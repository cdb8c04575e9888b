pub mod kronos;

use async_trait::async_trait;

use crate::config::AdapterConfig;
use crate::error::{ConfigError, EntryError};
use crate::model::time_entry::TimeEntry;

/// Where time entries are pushed to.
#[async_trait]
pub trait TimeEntryTarget: Send + Sync {
    fn name(&self) -> &str;

    /// Validate, convert and submit a single entry.
    async fn push(&self, entry: &TimeEntry) -> Result<(), EntryError>;
}


pub fn create_target(config: &AdapterConfig) -> Result<Box<dyn TimeEntryTarget>, ConfigError> {
    match config.kind.as_str() {
        kronos::KIND => Ok(Box::new(kronos::CapsysKronosTarget::from_config(config)?)),
        other => Err(ConfigError::UnknownKind {
            role: "target",
            kind: other.to_string(),
        }),
    }
}
