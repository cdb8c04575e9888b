use base64::Engine;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::toggl::{TogglTrackDefaults, TogglTrackSource, TogglTrackSpec};
use super::{create_source, TimeEntrySource};
use crate::config::AdapterConfig;
use crate::error::{ConfigError, EntryError};

const WORKSPACE: i64 = 4242;

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn spec(url: &str) -> TogglTrackSpec {
    TogglTrackSpec {
        workspace: Some(WORKSPACE),
        token: Some("secret".into()),
        url: Some(url.into()),
        timeout: Some("2s".into()),
        ca: None,
        defaults: TogglTrackDefaults {
            description: "default description".into(),
        },
    }
}

fn adapter(kind: &str, spec: &str) -> AdapterConfig {
    AdapterConfig {
        kind: kind.into(),
        spec: toml::from_str(spec).unwrap(),
    }
}

fn record(workspace: i64, start: &str, stop: Option<&str>, duration: f64, description: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "workspace_id": workspace,
        "start": start,
        "stop": stop,
        "duration": duration,
        "description": description,
        "tags": ["billable", "meeting"],
    })
}

async fn serve(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v9/me/time_entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pull_sends_window_and_basic_auth() {
    let server = MockServer::start().await;
    let encoded = base64::engine::general_purpose::STANDARD.encode("secret:api_token");

    Mock::given(method("GET"))
        .and(path("/api/v9/me/time_entries"))
        .and(query_param("start_date", "2025-06-01T00:00:00+02:00"))
        .and(query_param("end_date", "2025-06-02T00:00:00+02:00"))
        .and(header("Authorization", format!("Basic {encoded}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let entries = source
        .pull(at("2025-06-01T00:00:00+02:00"), at("2025-06-02T00:00:00+02:00"))
        .await
        .unwrap();

    assert!(entries.is_empty());
}

#[tokio::test]
async fn pull_converts_finished_entries_of_the_workspace() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([
            record(WORKSPACE, "2025-06-01T09:00:00+02:00", Some("2025-06-01T09:30:45+02:00"), 1845.0, "[ABC-123] did work"),
            record(WORKSPACE, "2025-06-01T10:00:00+02:00", None, -1748768400.0, "[ABC-124] still running"),
            record(7, "2025-06-01T11:00:00+02:00", Some("2025-06-01T12:00:00+02:00"), 3600.0, "[XYZ-1] other workspace"),
            record(WORKSPACE, "2025-06-01T13:00:00Z", Some("2025-06-01T14:00:00Z"), 3600.0, "Daily standup"),
        ]),
    )
    .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let entries = source
        .pull(at("2025-06-01T00:00:00+02:00"), at("2025-06-02T00:00:00+02:00"))
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.issue(), "ABC-123");
    assert_eq!(first.description(), "did work");
    assert_eq!(first.from(), at("2025-06-01T09:00:00+02:00"));
    assert_eq!(first.till(), first.from() + TimeDelta::seconds(1845));
    assert_eq!(first.tags(), &["billable".to_string(), "meeting".to_string()]);

    let second = &entries[1];
    assert_eq!(second.issue(), "Daily standup");
    assert_eq!(second.description(), "default description");
    assert_eq!(second.from().offset().local_minus_utc(), 0);
}

#[tokio::test]
async fn pull_is_deterministic() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([record(WORKSPACE, "2025-06-01T09:00:00+02:00", Some("2025-06-01T10:00:00+02:00"), 3600.5, "[ABC-1] x")]),
    )
    .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let from = at("2025-06-01T00:00:00+02:00");
    let till = at("2025-06-02T00:00:00+02:00");

    let once = source.pull(from, till).await.unwrap();
    let twice = source.pull(from, till).await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(once[0].duration(), TimeDelta::milliseconds(3_600_500));
}

#[tokio::test]
async fn pull_tolerates_null_description_and_tags() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([{
            "workspace_id": WORKSPACE,
            "start": "2025-06-01T09:00:00Z",
            "stop": "2025-06-01T09:10:00Z",
            "duration": 600,
            "description": null,
            "tags": null,
        }]),
    )
    .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let entries = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(entries[0].issue(), "");
    assert!(entries[0].tags().is_empty());
}

#[tokio::test]
async fn pull_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v9/me/time_entries"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Incorrect username and/or password"))
        .mount(&server)
        .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let err = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await
        .unwrap_err();

    match err {
        EntryError::Fetch { failure, .. } => {
            assert_eq!(failure.status().map(|s| s.as_u16()), Some(403));
            assert!(failure.to_string().contains("Incorrect username"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn pull_timeout_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v9/me/time_entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut slow = spec(&server.uri());
    slow.timeout = Some("200ms".into());
    let source = TogglTrackSource::new(slow).unwrap();
    let err = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await
        .unwrap_err();

    match err {
        EntryError::Fetch { failure, .. } => assert_eq!(failure.status(), None),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn pull_fails_on_malformed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v9/me/time_entries"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let err = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await
        .unwrap_err();

    assert!(matches!(err, EntryError::Parse { .. }));
}

#[tokio::test]
async fn one_bad_record_fails_the_whole_pull() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([
            record(WORKSPACE, "2025-06-01T09:00:00Z", Some("2025-06-01T10:00:00Z"), 3600.0, "[OK-1] fine"),
            record(WORKSPACE, "yesterday-ish", Some("2025-06-01T11:00:00Z"), 3600.0, "[BAD-1] broken"),
        ]),
    )
    .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let err = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await
        .unwrap_err();

    match err {
        EntryError::Parse { reason, .. } => assert!(reason.contains("yesterday-ish")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_length_record_is_malformed() {
    let server = MockServer::start().await;
    serve(
        &server,
        json!([record(WORKSPACE, "2025-06-01T09:00:00Z", Some("2025-06-01T09:00:00Z"), 0.0, "[A-1] blip")]),
    )
    .await;

    let source = TogglTrackSource::new(spec(&server.uri())).unwrap();
    let result = source
        .pull(at("2025-06-01T00:00:00Z"), at("2025-06-02T00:00:00Z"))
        .await;

    assert!(matches!(result, Err(EntryError::Parse { .. })));
}

#[test]
fn create_source_from_config() {
    let config = adapter("TogglTrack", "workspace = 1\ntoken = \"t\"\n");
    let source = create_source(&config).unwrap();
    assert_eq!(source.name(), "TogglTrack");
}

#[test]
fn create_source_rejects_unknown_kind() {
    let config = adapter("Clockify", "token = \"t\"\n");
    match create_source(&config) {
        Err(ConfigError::UnknownKind { role, kind }) => {
            assert_eq!(role, "source");
            assert_eq!(kind, "Clockify");
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("unknown kind accepted"),
    }
}

#[test]
fn create_source_requires_workspace() {
    let config = adapter("TogglTrack", "token = \"t\"\n");
    assert!(matches!(
        create_source(&config),
        Err(ConfigError::MissingField { field: "workspace", .. })
    ));
}

#[test]
fn create_source_rejects_non_integer_workspace() {
    let config = adapter("TogglTrack", "workspace = \"4242\"\ntoken = \"t\"\n");
    assert!(matches!(create_source(&config), Err(ConfigError::InvalidSpec { .. })));
}

#[test]
fn create_source_requires_non_empty_token() {
    let config = adapter("TogglTrack", "workspace = 1\ntoken = \"\"\n");
    assert!(matches!(
        create_source(&config),
        Err(ConfigError::MissingField { field: "token", .. })
    ));
}

#[test]
fn create_source_rejects_bad_timeout() {
    let config = adapter("TogglTrack", "workspace = 1\ntoken = \"t\"\ntimeout = \"forever\"\n");
    assert!(matches!(create_source(&config), Err(ConfigError::InvalidTimeout { .. })));
}
