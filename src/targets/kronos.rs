use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TimeEntryTarget;
use crate::config::AdapterConfig;
use crate::error::{ConfigError, EntryError, HttpFailure};
use crate::model::time_entry::TimeEntry;
use crate::util::http::{build_client, check_status, join_url, parse_timeout};

pub const KIND: &str = "CapsysKronos";

const DEFAULT_URL: &str = "https://jira.capsys.hu";
const DEFAULT_ACTIVITY_CATEGORY_ID: i64 = 3;
const DEFAULT_ACTIVITY_TYPE_ID: i64 = 5;
const DEFAULT_SITE_ID: i64 = 31;

/// Kronos stores wall-clock times without an offset and reads them as
/// Budapest time.
const TARGET_ZONE: Tz = chrono_tz::Europe::Budapest;

#[derive(Debug, Deserialize)]
pub struct CapsysKronosSpec {
    pub token: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<String>,
    pub ca: Option<PathBuf>,
    #[serde(default)]
    pub tags: HashMap<String, WorklogOverride>,
    #[serde(default)]
    pub defaults: CapsysKronosDefaults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsysKronosDefaults {
    pub activity_category_id: Option<i64>,
    pub activity_type_id: Option<i64>,
    pub site_id: Option<i64>,
    pub comment: Option<String>,
}

/// Fields a tag replaces in the work log when an entry carries it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorklogOverride {
    pub issue_key: Option<String>,
    pub time_spent: Option<i64>,
    pub start_offset_date_time: Option<String>,
    pub comment: Option<String>,
    pub activity_category_id: Option<i64>,
    pub activity_type_id: Option<i64>,
    pub site_id: Option<i64>,
}

impl WorklogOverride {
    pub fn apply(&self, input: &mut WorklogInput) {
        if let Some(issue_key) = &self.issue_key {
            input.issue_key = issue_key.clone();
        }
        if let Some(time_spent) = self.time_spent {
            input.time_spent = time_spent;
        }
        if let Some(start) = &self.start_offset_date_time {
            input.start_offset_date_time = start.clone();
        }
        if let Some(comment) = &self.comment {
            input.comment = comment.clone();
        }
        if let Some(id) = self.activity_category_id {
            input.activity_category_id = id;
        }
        if let Some(id) = self.activity_type_id {
            input.activity_type_id = id;
        }
        if let Some(id) = self.site_id {
            input.site_id = id;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub worklog_input: WorklogInput,
    pub travel_input: TravelInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogInput {
    pub issue_key: String,
    pub time_spent: i64,
    pub start_offset_date_time: String,
    pub comment: String,
    pub activity_category_id: i64,
    pub activity_type_id: i64,
    pub site_id: i64,
}

// Required by the API even though travel is never logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInput {
    pub travel_to_time_spent_in_minutes: i64,
    pub travel_from_time_spent_in_minutes: i64,
    pub from_site_id: Option<i64>,
}

pub struct CapsysKronosTarget {
    base_url: String,
    auth_header: String,
    tags: HashMap<String, WorklogOverride>,
    activity_category_id: i64,
    activity_type_id: i64,
    site_id: i64,
    comment: String,
    client: reqwest::Client,
}

impl CapsysKronosTarget {
    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        Self::new(config.decode_spec(KIND)?)
    }

    pub fn new(spec: CapsysKronosSpec) -> Result<Self, ConfigError> {
        let token = spec
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField {
                kind: KIND,
                field: "token",
            })?;
        let timeout = parse_timeout(spec.timeout.as_deref(), KIND)?;
        let client = build_client(timeout, spec.ca.as_deref())?;
        let defaults = spec.defaults;

        Ok(Self {
            base_url: spec.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            auth_header: format!("Bearer {token}"),
            tags: spec.tags,
            activity_category_id: defaults
                .activity_category_id
                .unwrap_or(DEFAULT_ACTIVITY_CATEGORY_ID),
            activity_type_id: defaults.activity_type_id.unwrap_or(DEFAULT_ACTIVITY_TYPE_ID),
            site_id: defaults.site_id.unwrap_or(DEFAULT_SITE_ID),
            comment: defaults.comment.unwrap_or_default(),
            client,
        })
    }

    /// Build the write payload for `entry`. Tag overrides are applied in tag
    /// order, so a later tag wins over an earlier one.
    pub fn convert(&self, entry: &TimeEntry) -> LogEntry {
        let comment = if entry.description().is_empty() {
            self.comment.clone()
        } else {
            entry.description().to_string()
        };

        let mut worklog_input = WorklogInput {
            issue_key: entry.issue().to_string(),
            time_spent: entry.duration().num_minutes(),
            start_offset_date_time: truncate_to_minute(entry.from())
                .with_timezone(&TARGET_ZONE)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            comment,
            activity_category_id: self.activity_category_id,
            activity_type_id: self.activity_type_id,
            site_id: self.site_id,
        };

        for tag in entry.tags() {
            if let Some(tag_override) = self.tags.get(tag) {
                tag_override.apply(&mut worklog_input);
            }
        }

        LogEntry {
            worklog_input,
            travel_input: TravelInput::default(),
        }
    }

    async fn validate_issue(&self, issue: &str) -> Result<(), EntryError> {
        let url = join_url(
            &self.base_url,
            &format!("/rest/api/latest/issue/{}", urlencoding::encode(issue)),
        );
        debug!(%url, "validating {KIND} issue");

        let invalid = |failure| EntryError::Validation {
            service: KIND,
            issue: issue.to_string(),
            failure,
        };

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| invalid(HttpFailure::Transport(e)))?;
        check_status(resp).await.map_err(invalid)?;

        Ok(())
    }

    async fn post_entry(&self, log_entry: &LogEntry) -> Result<(), EntryError> {
        let url = join_url(&self.base_url, "/rest/kronos/1.0/log-entry");
        debug!(%url, issue = %log_entry.worklog_input.issue_key, "creating {KIND} entry");

        let rejected = |failure| EntryError::Submit {
            service: KIND,
            failure,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(log_entry)
            .send()
            .await
            .map_err(|e| rejected(HttpFailure::Transport(e)))?;
        check_status(resp).await.map_err(rejected)?;

        Ok(())
    }
}

fn truncate_to_minute(instant: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    instant
        - TimeDelta::seconds(i64::from(instant.second()))
        - TimeDelta::nanoseconds(i64::from(instant.nanosecond()))
}

#[async_trait]
impl TimeEntryTarget for CapsysKronosTarget {
    fn name(&self) -> &str {
        KIND
    }

    async fn push(&self, entry: &TimeEntry) -> Result<(), EntryError> {
        self.validate_issue(entry.issue()).await?;
        let log_entry = self.convert(entry);
        self.post_entry(&log_entry).await
    }
}
