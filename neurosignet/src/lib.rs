//! # neurosignet: document analysis service
//!
//! `neurosignet` accepts scanned documents over HTTP, stores them on disk and runs them through an
//! analysis engine that reports handwritten signatures, seals and whether the document was
//! quality-enhanced. It also serves a small browser dashboard and a WebSocket channel that streams
//! progress percentages to it.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum). There is no database:
//! uploads are written to the directories named in [`config::StorageConfig`] and every analysis
//! result is returned inline in the response that triggered it.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the pages at `/` and `/dashboard`, the JSON API under
//! `/api`, and the progress channel at `/ws/progress`.
//!
//! The **storage layer** ([`storage`]) validates and sanitizes uploaded filenames, enforces the
//! size limit while streaming, and cleans up after failed uploads.
//!
//! The **engine** ([`processing`]) sits behind the [`processing::DocumentProcessor`] trait. The
//! shipped [`processing::SimulatedProcessor`] waits for a configurable delay and reports fixed
//! findings.
//!
//! The **progress schedule** ([`progress`]) produces the timer-driven percentage sequence.
//!
//! The **installer** ([`installer`]) provisions a self-contained installation directory and is
//! reached through the `install` subcommand.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use neurosignet::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = neurosignet::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     neurosignet::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod errors;
pub mod installer;
mod openapi;
pub mod processing;
pub mod progress;
mod static_assets;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_utils;

use std::io;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use minijinja::Environment;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;
use crate::processing::{DocumentProcessor, SimulatedProcessor};
use crate::progress::ProgressSchedule;
use crate::storage::UploadStore;

/// Room left in a request body for multipart boundaries and the non-file form fields
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .processor(Arc::new(SimulatedProcessor::new(delay)))
///     .store(store)
///     .progress(schedule)
///     .templates(Arc::new(templates))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub processor: Arc<dyn DocumentProcessor>,
    pub store: UploadStore,
    pub progress: ProgressSchedule,
    pub templates: Arc<Environment<'static>>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A wildcard anywhere in the list opens the service to every origin
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Body limits for the single and batch upload routes
fn upload_body_limits(config: &Config) -> (usize, usize) {
    let per_file = usize::try_from(config.limits.max_file_size).unwrap_or(usize::MAX);
    let single = per_file.saturating_add(MULTIPART_OVERHEAD);
    let batch = per_file
        .saturating_mul(config.limits.max_batch_files)
        .saturating_add(MULTIPART_OVERHEAD);
    (single, batch)
}

/// Build the application router with all endpoints and middleware.
///
/// - Pages (`/`, `/dashboard`) and embedded assets (`/static/*`)
/// - JSON API (`/api/health`, `/api/v1/*`) with per-route upload body limits
/// - Progress WebSocket (`/ws/progress`)
/// - Read-only file trees (`/uploads/*`, `/exports/*`)
/// - API docs (`/api/docs`, `/api/openapi.json`)
/// - Optional Prometheus metrics (`/internal/metrics`)
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{analyze, health, history, pages, progress, static_assets};

    let (single_limit, batch_limit) = upload_body_limits(&state.config);

    let router = Router::new()
        .route("/", get(pages::home))
        .route("/dashboard", get(pages::dashboard))
        .route("/api/health", get(health::health_check))
        .route(
            "/api/v1/analyze",
            post(analyze::analyze_document).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/api/v1/batch-analyze",
            post(analyze::batch_analyze).layer(DefaultBodyLimit::max(batch_limit)),
        )
        .route("/api/v1/history", get(history::get_history))
        .route("/ws/progress", get(progress::progress_socket))
        .route("/static/{*path}", get(static_assets::serve_static_asset))
        .nest_service("/uploads", ServeDir::new(state.store.uploads_dir()))
        .nest_service("/exports", ServeDir::new(state.store.exports_dir()))
        .with_state(state.clone())
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Bind `host` on the first free port in `port..port + attempts`.
///
/// Each candidate is bound directly rather than probed first, so the returned listener owns the
/// port. Errors other than "address in use" end the search immediately.
pub async fn bind_listener(host: &str, port: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    for offset in 0..attempts.max(1) {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };

        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if offset > 0 {
                    warn!(requested = port, bound = candidate, "Requested port was busy, using the next free one");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                debug!(port = candidate, "Port in use");
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to bind {host}:{candidate}")),
        }
    }

    anyhow::bail!(
        "No free port on {host} in range {port}..{}",
        port.saturating_add(attempts.saturating_sub(1))
    )
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] creates the storage layout, compiles the page templates
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds to the first free port and handles requests
/// 3. **Shutdown**: When the shutdown future resolves, in-flight requests finish and telemetry
///    is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting with configuration: {:#?}", config);

        let store = UploadStore::new(config.storage.clone(), config.limits.clone());
        store
            .ensure_layout()
            .await
            .context("Failed to create storage directories")?;

        let templates = api::handlers::pages::template_environment().context("Failed to compile page templates")?;

        let state = AppState::builder()
            .config(config.clone())
            .processor(Arc::new(SimulatedProcessor::new(config.processing.delay)))
            .store(store)
            .progress(ProgressSchedule::from(&config.progress))
            .templates(Arc::new(templates))
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = bind_listener(&self.config.host, self.config.port, self.config.port_search_attempts).await?;
        let local_addr = listener.local_addr()?;
        info!(
            "{} listening on http://{}, available at http://localhost:{}",
            self.config.metadata.name,
            local_addr,
            local_addr.port()
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};

    fn document(filename: &str, bytes: &[u8]) -> Part {
        Part::bytes(bytes.to_vec()).file_name(filename).mime_type("application/octet-stream")
    }

    #[test_log::test(tokio::test)]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].as_str().is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_analyze_stores_document_and_reports_findings() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new().add_part("file", document("contract.pdf", b"%PDF-1.7 test"));
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["filename"], "contract.pdf");
        assert_eq!(body["result"]["processed"], true);
        assert_eq!(body["result"]["signatures_found"], 2);
        assert_eq!(body["result"]["seals_found"], 1);
        assert_eq!(body["result"]["quality_enhanced"], true);
        assert_eq!(body["result"]["analysis"]["confidence"], 0.95);
        assert_eq!(body["result"]["analysis"]["document_type"], "contract");
        assert_eq!(body["task_id"], body["result"]["task_id"]);

        let task_id = body["task_id"].as_str().unwrap();
        let stored = dir.path().join("uploads").join(format!("{task_id}_contract.pdf"));
        assert_eq!(std::fs::read(stored).unwrap(), b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_analyze_respects_flags() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new()
            .add_text("enhance_quality", "false")
            .add_text("detect_signatures", "false")
            .add_text("detect_seals", "true")
            .add_text("language", "ru")
            .add_part("file", document("scan.PNG", b"\x89PNG"));
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["result"]["signatures_found"], 0);
        assert_eq!(body["result"]["seals_found"], 1);
        assert_eq!(body["result"]["quality_enhanced"], false);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_flag_and_removes_upload() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new()
            .add_part("file", document("flag.pdf", b"data"))
            .add_text("detect_seals", "sometimes");
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("detect_seals"));
        assert!(stored_copies(dir.path(), "flag.pdf").is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new().add_part("file", document("notes.txt", b"hello"));
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains(".txt"));
        assert!(stored_copies(dir.path(), "notes.txt").is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_oversized_document() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new().add_part("file", document("huge.pdf", &[0u8; 4096]));
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(stored_copies(dir.path(), "huge.pdf").is_empty());
    }

    #[tokio::test]
    async fn test_analyze_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new().add_text("language", "en");
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Missing required field: 'file'");
    }

    #[tokio::test]
    async fn test_analyze_rejects_second_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new()
            .add_part("file", document("one.pdf", b"1"))
            .add_part("file", document("two.pdf", b"2"));
        let response = server.post("/api/v1/analyze").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(stored_copies(dir.path(), "one.pdf").is_empty());
        assert!(stored_copies(dir.path(), "two.pdf").is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_batch_reports_each_document() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new()
            .add_part("files", document("a.pdf", b"a"))
            .add_part("files", document("b.exe", b"b"))
            .add_part("files", document("c.jpg", b"c"));
        let response = server.post("/api/v1/batch-analyze").multipart(form).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["processed_files"], 3);

        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["success"], true);
        assert_eq!(results[0]["result"]["filename"], "a.pdf");
        assert_eq!(results[1]["success"], false);
        assert!(results[1]["error"].as_str().unwrap().contains(".exe"));
        assert_eq!(results[2]["success"], true);

        // The batch id is distinct from every per-document task id
        assert_ne!(body["task_id"], results[0]["task_id"]);
        assert_ne!(body["task_id"], results[2]["task_id"]);
    }

    #[tokio::test]
    async fn test_batch_limit_recorded_inline() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let mut form = MultipartForm::new();
        for i in 0..4 {
            form = form.add_part("files", document(&format!("doc{i}.pdf"), b"x"));
        }
        let response = server.post("/api/v1/batch-analyze").multipart(form).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["processed_files"], 4);
        let results = body["results"].as_array().unwrap();
        assert!(results[..3].iter().all(|r| r["success"] == true));
        assert_eq!(results[3]["success"], false);
        assert!(stored_copies(dir.path(), "doc3.pdf").is_empty());
    }

    #[tokio::test]
    async fn test_batch_requires_files() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let form = MultipartForm::new().add_text("note", "nothing attached");
        let response = server.post("/api/v1/batch-analyze").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_history_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let response = server.get("/api/v1/history").await;
        response.assert_status_ok();
        response.assert_json(&json!({"page": 1, "limit": 20, "total": 0, "results": []}));

        let response = server.get("/api/v1/history").add_query_param("page", 3).add_query_param("limit", 500).await;
        response.assert_status_ok();
        response.assert_json(&json!({"page": 3, "limit": 100, "total": 0, "results": []}));
    }

    #[tokio::test]
    async fn test_history_rejects_malformed_pagination() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let response = server.get("/api/v1/history").add_query_param("page", "abc").await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Invalid pagination parameters"));
    }

    #[tokio::test]
    async fn test_progress_channel_streams_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_http_test_app(create_test_config(dir.path())).await;

        let mut websocket = server.get_websocket("/ws/progress").await.into_websocket().await;
        websocket
            .send_json(&json!({"type": "subscribe_progress", "task_id": "task-42"}))
            .await;

        for expected in (0..=100).step_by(10) {
            let update: Value = websocket.receive_json().await;
            assert_eq!(
                update,
                json!({"type": "progress_update", "task_id": "task-42", "progress": expected, "status": "processing"})
            );
        }
    }

    #[tokio::test]
    async fn test_progress_channel_survives_bad_frame() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_http_test_app(create_test_config(dir.path())).await;

        let mut websocket = server.get_websocket("/ws/progress").await.into_websocket().await;
        websocket.send_text("not json").await;

        let reply: Value = websocket.receive_json().await;
        assert_eq!(reply["type"], "error");

        websocket
            .send_json(&json!({"type": "subscribe_progress", "task_id": "again"}))
            .await;
        let update: Value = websocket.receive_json().await;
        assert_eq!(update["progress"], 0);
        assert_eq!(update["task_id"], "again");
    }

    #[tokio::test]
    async fn test_progress_channel_echoes_numeric_task_id() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_http_test_app(create_test_config(dir.path())).await;

        let mut websocket = server.get_websocket("/ws/progress").await.into_websocket().await;
        websocket
            .send_json(&json!({"type": "subscribe_progress", "task_id": 42}))
            .await;

        let update: Value = websocket.receive_json().await;
        assert_eq!(update["type"], "progress_update");
        assert_eq!(update["task_id"], json!(42));
    }

    #[tokio::test]
    async fn test_pages_render() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let home = server.get("/").await;
        home.assert_status_ok();
        assert!(home.text().contains("NeuroSigNet Pro"));
        assert!(home.text().contains("/dashboard"));

        let dashboard = server.get("/dashboard").await;
        dashboard.assert_status_ok();
        let html = dashboard.text();
        assert!(html.contains("/api/v1/analyze") || html.contains("/static/js/dashboard.js"));
        assert!(html.contains(".pdf"));
        assert!(html.contains(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_uploads_served_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        std::fs::write(dir.path().join("exports").join("report.json"), b"{}").unwrap();

        let response = server.get("/exports/report.json").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "{}");

        server.get("/uploads/missing.pdf").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_docs_served() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let doc = server.get("/api/openapi.json").await;
        doc.assert_status_ok();
        assert!(doc.json::<Value>()["paths"]["/api/v1/analyze"].is_object());

        server.get("/api/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_metrics_disabled_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config(dir.path());
        config.enable_metrics = true;
        let server = create_test_app(config).await;

        server.get("/api/health").await.assert_status_ok();

        let metrics_response = server.get("/internal/metrics").await;
        metrics_response.assert_status_ok();
        let metrics_content = metrics_response.text();
        assert!(metrics_content.contains("# HELP") || metrics_content.contains("# TYPE"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_app(create_test_config(dir.path())).await;

        let response = server
            .method(http::Method::OPTIONS, "/api/v1/analyze")
            .add_header("origin", "http://localhost:3000")
            .add_header("access-control-request-method", "POST")
            .await;

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .map(|v| v.to_str().unwrap()),
            Some("*")
        );
    }

    #[test]
    fn test_upload_body_limits() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let (single, batch) = upload_body_limits(&config);
        assert_eq!(single, 1024 + MULTIPART_OVERHEAD);
        assert_eq!(batch, 1024 * 3 + MULTIPART_OVERHEAD);

        let mut config = Config::default();
        config.limits.max_file_size = u64::MAX;
        let (single, batch) = upload_body_limits(&config);
        assert_eq!(single, usize::MAX);
        assert_eq!(batch, usize::MAX);
    }

    #[tokio::test]
    async fn test_bind_listener_skips_busy_port() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        match bind_listener("127.0.0.1", port, 1).await {
            Ok(_) => panic!("port {port} should be busy"),
            Err(e) => assert!(e.to_string().contains("No free port")),
        }

        // The search may land anywhere above the busy port, as long as it moved on
        if let Ok(listener) = bind_listener("127.0.0.1", port, 20).await {
            assert_ne!(listener.local_addr().unwrap().port(), port);
        }
    }
}
