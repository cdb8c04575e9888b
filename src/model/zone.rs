use chrono::{DateTime, FixedOffset, Local};
use chrono_tz::Tz;

use crate::error::ConfigError;

const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";

/// Zone used when rendering entries for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Named(Tz),
}

impl DisplayZone {
    /// `None` and `"Local"` mean the system zone; anything else must be an
    /// IANA zone name.
    pub fn parse(name: Option<&str>) -> Result<Self, ConfigError> {
        match name {
            None | Some("Local") => Ok(DisplayZone::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(DisplayZone::Named)
                .map_err(|_| ConfigError::Timezone(name.to_string())),
        }
    }

    pub fn format(&self, instant: &DateTime<FixedOffset>) -> String {
        match self {
            DisplayZone::Local => instant.with_timezone(&Local).format(DATE_TIME).to_string(),
            DisplayZone::Named(tz) => instant.with_timezone(tz).format(DATE_TIME).to_string(),
        }
    }
}
