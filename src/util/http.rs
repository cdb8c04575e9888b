use std::path::Path;
use std::time::Duration;

use reqwest::Response;

use crate::error::{ConfigError, HttpFailure};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client an adapter keeps for its whole lifetime. The CA bundle,
/// when given, is read here and never again.
pub fn build_client(timeout: Duration, ca: Option<&Path>) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(path) = ca {
        let pem = std::fs::read(path).map_err(|source| ConfigError::CaRead {
            path: path.to_path_buf(),
            source,
        })?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|source| {
            ConfigError::CaInvalid {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if certs.is_empty() {
            return Err(ConfigError::CaEmpty {
                path: path.to_path_buf(),
            });
        }
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder.build().map_err(ConfigError::Client)
}

/// Parse an optional duration spec such as `10s` or `1m 30s`.
pub fn parse_timeout(
    spec: Option<&str>,
    kind: &'static str,
) -> Result<Duration, ConfigError> {
    match spec {
        Some(s) => humantime::parse_duration(s)
            .map_err(|source| ConfigError::InvalidTimeout { kind, source }),
        None => Ok(DEFAULT_TIMEOUT),
    }
}

/// Pass 2xx responses through; turn everything else into a failure carrying
/// the status and the (single-line) body.
pub async fn check_status(response: Response) -> Result<Response, HttpFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .map(|b| b.replace(['\r', '\n'], ""))
        .unwrap_or_default();
    Err(HttpFailure::Status { status, body })
}

pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
