//! Integration tests for the metar-raspi CLI and provider client

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tempdir::TempDir;

use metar_raspi::api::{AviationWeatherClient, MetarSource};
use metar_raspi::config::SourceConfig;
use metar_raspi::models::{FlightRules, Ident};
use metar_raspi::{MetarError, Session};

const KJFK_METAR: &str = include_str!("fixtures/kjfk_metar.json");
const KJFK_STATION: &str = include_str!("fixtures/kjfk_station.json");

/// How the fake provider answers
#[derive(Clone, Copy)]
enum Mode {
    /// Fixture for KJFK, nothing for anything else
    Normal,
    /// 204 for every request
    NoContent,
    /// 503 for the first `n` requests, then normal
    Unavailable(usize),
}

#[derive(Clone)]
struct Provider {
    mode: Mode,
    hits: Arc<AtomicUsize>,
}

fn json(body: &'static str) -> Response {
    ([("content-type", "application/json")], body).into_response()
}

async fn metar(
    State(provider): State<Provider>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let hit = provider.hits.fetch_add(1, Ordering::SeqCst);
    match provider.mode {
        Mode::NoContent => StatusCode::NO_CONTENT.into_response(),
        Mode::Unavailable(n) if hit < n => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ if params.get("ids").map(String::as_str) == Some("KJFK") => json(KJFK_METAR),
        _ => json("[]"),
    }
}

async fn station_info(Query(params): Query<HashMap<String, String>>) -> Response {
    if params.get("ids").map(String::as_str) == Some("KJFK") {
        json(KJFK_STATION)
    } else {
        json("[]")
    }
}

/// Serve the fake provider on a random local port
async fn serve(mode: Mode) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let provider = Provider {
        mode,
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/api/data/metar", get(metar))
        .route("/api/data/stationinfo", get(station_info))
        .with_state(provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}/api/data")
}

fn client(addr: SocketAddr) -> AviationWeatherClient {
    let config = SourceConfig {
        base_url: base_url(addr),
        timeout_seconds: 5,
        max_retries: 2,
        ..SourceConfig::default()
    };
    AviationWeatherClient::new(&config)
        .unwrap()
        .with_retry_backoff(Duration::from_millis(10))
}

/// Run the built binary with a config file that does not exist, so the
/// user's own config never leaks in
fn metar_raspi(dir: &Path, args: &[&str], env: &[(&str, String)]) -> Output {
    let config = dir.join("missing.toml");
    let mut command = Command::new(env!("CARGO_BIN_EXE_metar-raspi"));
    command
        .arg("--config")
        .arg(&config)
        .args(args)
        .env("METAR_RASPI_SYSTEM__SESSION_FILE", dir.join("session.json"))
        .env_remove("RUST_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("Failed to execute command")
}

/// Same as `metar_raspi`, off the async runtime so the fake provider keeps serving
async fn metar_raspi_async(dir: &Path, args: &[&str], env: &[(&str, String)]) -> Output {
    let dir = dir.to_path_buf();
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    let env: Vec<(String, String)> = env.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let env: Vec<(&str, String)> = env.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        metar_raspi(&dir, &args, &env)
    })
    .await
    .unwrap()
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi(dir.path(), &["--help"], &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("METAR"));
    assert!(stdout.contains("screen"));
    assert!(stdout.contains("plate"));
    assert!(stdout.contains("report"));
}

#[test]
fn test_cli_requires_subcommand() {
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi(dir.path(), &[], &[]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_rejects_bad_station() {
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi(dir.path(), &["report", "KJ"], &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid input"), "stderr: {stderr}");
}

#[test]
fn test_cli_rejects_invalid_config() {
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi(
        dir.path(),
        &["report", "KJFK"],
        &[("METAR_RASPI_UPDATE__INTERVAL_SECONDS", "5".to_string())],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_report() {
    let (addr, _) = serve(Mode::Normal).await;
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi_async(
        dir.path(),
        &["report", "kjfk"],
        &[("METAR_RASPI_SOURCE__BASE_URL", base_url(addr))],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("KJFK 191651Z 31012G20KT"));
    assert!(stdout.contains("Flight rules: VFR"));
    assert!(stdout.contains("Wind: 310 at 12 kt gusting 20 kt varying 280-340"));
    assert!(stdout.contains("Remarks: AO2 SLP199"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_report_unknown_station() {
    let (addr, _) = serve(Mode::Normal).await;
    let dir = TempDir::new("metar-cli").unwrap();
    let output = metar_raspi_async(
        dir.path(),
        &["report", "QQQQ"],
        &[("METAR_RASPI_SOURCE__BASE_URL", base_url(addr))],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No current report for QQQQ"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_screen_snapshot() {
    let (addr, _) = serve(Mode::Normal).await;
    let dir = TempDir::new("metar-cli").unwrap();
    let png = dir.path().join("screen.png");
    let output = metar_raspi_async(
        dir.path(),
        &["screen", "--station", "KJFK", "--snapshot", png.to_str().unwrap()],
        &[
            ("METAR_RASPI_SOURCE__BASE_URL", base_url(addr)),
            ("METAR_RASPI_SCREEN__SIZE", "480x320".to_string()),
        ],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(png.exists());
    // A snapshot is a one-off render and does not touch the session
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn test_client_latest_report() {
    let (addr, _) = serve(Mode::Normal).await;
    let client = client(addr);

    let report = client
        .latest(&Ident::parse("KJFK").unwrap())
        .await
        .unwrap()
        .expect("report");
    assert_eq!(report.station, "KJFK");
    assert_eq!(report.flight_rules, Some(FlightRules::Vfr));
    assert_eq!(report.time_repr(), "1651Z");
    assert_eq!(report.remarks.as_deref(), Some("AO2 SLP199"));
}

#[tokio::test]
async fn test_client_empty_and_no_content() {
    let (addr, _) = serve(Mode::Normal).await;
    let empty = client(addr).latest(&Ident::parse("EGLL").unwrap()).await;
    assert!(matches!(empty, Ok(None)));

    let (addr, _) = serve(Mode::NoContent).await;
    let no_content = client(addr).latest(&Ident::parse("KJFK").unwrap()).await;
    assert!(matches!(no_content, Ok(None)));
}

#[tokio::test]
async fn test_client_retries_unavailable_provider() {
    let (addr, hits) = serve(Mode::Unavailable(2)).await;
    let report = client(addr)
        .latest(&Ident::parse("KJFK").unwrap())
        .await
        .unwrap();

    assert!(report.is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_gives_up_after_max_retries() {
    let (addr, hits) = serve(Mode::Unavailable(10)).await;
    let err = client(addr)
        .latest(&Ident::parse("KJFK").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, MetarError::Source { status: Some(503), .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_station_info() {
    let (addr, _) = serve(Mode::Normal).await;
    let client = client(addr);

    let info = client
        .station_info(&Ident::parse("KJFK").unwrap())
        .await
        .unwrap();
    assert!(info.sends_reports());
    assert_eq!(info.name.as_deref(), Some("New York/JF Kennedy Intl"));

    let err = client
        .station_info(&Ident::parse("QQQQ").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, MetarError::BadStation { .. }));
}

#[test]
fn test_session_survives_restart() {
    let dir = TempDir::new("metar-session").unwrap();
    let path = dir.path().join("nested").join("session.json");

    let session = Session {
        station: "EGLL".to_string(),
        inverted: true,
    };
    session.save(&path).unwrap();
    assert_eq!(Session::load(&path, "KJFK"), session);

    std::fs::write(&path, "not json").unwrap();
    assert_eq!(Session::load(&path, "KJFK").station, "KJFK");
}
