use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while turning configuration into adapters. Always fatal,
/// and always raised before any request goes out.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported time entry {role}: {kind}")]
    UnknownKind { role: &'static str, kind: String },

    #[error("invalid '{kind}' spec")]
    InvalidSpec {
        kind: &'static str,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid or missing '{field}' spec for {kind}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("invalid 'timeout' spec for {kind}")]
    InvalidTimeout {
        kind: &'static str,
        #[source]
        source: humantime::DurationError,
    },

    #[error("cannot read CA bundle {}", .path.display())]
    CaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CA bundle {}", .path.display())]
    CaInvalid {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("no certificates found in CA bundle {}", .path.display())]
    CaEmpty { path: PathBuf },

    #[error("cannot build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("unknown timezone '{0}'")]
    Timezone(String),
}

/// Why an HTTP exchange did not succeed.
#[derive(Debug, Error)]
pub enum HttpFailure {
    #[error("unexpected status {status}{}", fmt_body(.body))]
    Status { status: StatusCode, body: String },

    #[error("request failed")]
    Transport(#[source] reqwest::Error),
}

fn fmt_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl HttpFailure {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpFailure::Status { status, .. } => Some(*status),
            HttpFailure::Transport(err) => err.status(),
        }
    }
}

/// Per-run failures of the pull and push sides.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("cannot get {service} entries")]
    Fetch {
        service: &'static str,
        #[source]
        failure: HttpFailure,
    },

    #[error("malformed {service} entry: {reason}")]
    Parse {
        service: &'static str,
        reason: String,
    },

    #[error("invalid {service} issue [{issue}]")]
    Validation {
        service: &'static str,
        issue: String,
        #[source]
        failure: HttpFailure,
    },

    #[error("could not create {service} entry")]
    Submit {
        service: &'static str,
        #[source]
        failure: HttpFailure,
    },
}

impl EntryError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EntryError::Fetch { failure, .. }
            | EntryError::Validation { failure, .. }
            | EntryError::Submit { failure, .. } => failure.status(),
            EntryError::Parse { .. } => None,
        }
    }
}
