use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use super::TimeEntrySource;
use crate::config::AdapterConfig;
use crate::error::{ConfigError, EntryError, HttpFailure};
use crate::model::time_entry::TimeEntry;
use crate::util::http::{build_client, check_status, join_url, parse_timeout};

pub const KIND: &str = "TogglTrack";

const DEFAULT_URL: &str = "https://api.track.toggl.com";

// Toggl expects the token as user name and this literal as password.
const BASIC_PASSWORD: &str = "api_token";

static ISSUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9-]+)\]").expect("issue pattern is valid"));

#[derive(Debug, Deserialize)]
pub struct TogglTrackSpec {
    pub workspace: Option<i64>,
    pub token: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<String>,
    pub ca: Option<PathBuf>,
    #[serde(default)]
    pub defaults: TogglTrackDefaults,
}

#[derive(Debug, Default, Deserialize)]
pub struct TogglTrackDefaults {
    #[serde(default)]
    pub description: String,
}

pub struct TogglTrackSource {
    workspace: i64,
    base_url: String,
    auth_header: String,
    default_description: String,
    client: reqwest::Client,
}

impl TogglTrackSource {
    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        Self::new(config.decode_spec(KIND)?)
    }

    pub fn new(spec: TogglTrackSpec) -> Result<Self, ConfigError> {
        let workspace = spec.workspace.ok_or(ConfigError::MissingField {
            kind: KIND,
            field: "workspace",
        })?;
        let token = spec
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField {
                kind: KIND,
                field: "token",
            })?;
        let timeout = parse_timeout(spec.timeout.as_deref(), KIND)?;
        let client = build_client(timeout, spec.ca.as_deref())?;

        let creds = format!("{token}:{BASIC_PASSWORD}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);

        Ok(Self {
            workspace,
            base_url: spec.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            auth_header: format!("Basic {encoded}"),
            default_description: spec.defaults.description,
            client,
        })
    }

    async fn fetch_entries(
        &self,
        from: DateTime<FixedOffset>,
        till: DateTime<FixedOffset>,
    ) -> Result<Vec<TogglEntry>, EntryError> {
        let url = join_url(
            &self.base_url,
            &format!(
                "/api/v9/me/time_entries?start_date={}&end_date={}",
                urlencoding::encode(&from.to_rfc3339_opts(SecondsFormat::Secs, true)),
                urlencoding::encode(&till.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
        );
        debug!(%url, "fetching {KIND} entries");

        let fetch_failed = |failure| EntryError::Fetch {
            service: KIND,
            failure,
        };

        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| fetch_failed(HttpFailure::Transport(e)))?;
        let resp = check_status(resp).await.map_err(fetch_failed)?;

        let body = resp
            .text()
            .await
            .map_err(|e| fetch_failed(HttpFailure::Transport(e)))?;

        serde_json::from_str(&body).map_err(|e| EntryError::Parse {
            service: KIND,
            reason: e.to_string(),
        })
    }

    fn convert_entry(&self, entry: TogglEntry) -> Result<TimeEntry, EntryError> {
        let malformed = |reason: String| EntryError::Parse {
            service: KIND,
            reason,
        };

        let from = DateTime::parse_from_rfc3339(&entry.start)
            .map_err(|e| malformed(format!("invalid start '{}': {e}", entry.start)))?;
        let duration = seconds_to_delta(entry.duration)
            .ok_or_else(|| malformed(format!("invalid duration {}", entry.duration)))?;
        let till = from
            .checked_add_signed(duration)
            .ok_or_else(|| malformed(format!("duration {} out of range", entry.duration)))?;

        let raw = entry.description.unwrap_or_default();
        let (issue, description) = split_issue(&raw, &self.default_description);

        TimeEntry::new(
            issue,
            from,
            till,
            description,
            entry.tags.unwrap_or_default(),
        )
        .map_err(|e| malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TogglEntry {
    workspace_id: i64,
    start: String,
    stop: Option<String>,
    duration: f64,
    description: Option<String>,
    tags: Option<Vec<String>>,
}

/// Split `"[KEY] text"` into `("KEY", "text")`. Without a bracketed key the
/// whole text is the issue and the description falls back to `default`.
fn split_issue(raw: &str, default: &str) -> (String, String) {
    match ISSUE_PATTERN.captures(raw) {
        Some(caps) => {
            let issue = caps[1].to_string();
            let description = raw.replacen(&caps[0], "", 1).trim().to_string();
            (issue, description)
        }
        None => (raw.to_string(), default.to_string()),
    }
}

fn seconds_to_delta(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round() as i64;
    TimeDelta::try_seconds(whole as i64)?.checked_add(&TimeDelta::nanoseconds(nanos))
}

#[async_trait]
impl TimeEntrySource for TogglTrackSource {
    fn name(&self) -> &str {
        KIND
    }

    async fn pull(
        &self,
        from: DateTime<FixedOffset>,
        till: DateTime<FixedOffset>,
    ) -> Result<Vec<TimeEntry>, EntryError> {
        let raw = self.fetch_entries(from, till).await?;
        let total = raw.len();

        let entries = raw
            .into_iter()
            .filter(|e| e.workspace_id == self.workspace && e.stop.is_some())
            .map(|e| self.convert_entry(e))
            .collect::<Result<Vec<_>, _>>()?;

        info!(total, kept = entries.len(), "pulled {KIND} entries");
        Ok(entries)
    }
}
