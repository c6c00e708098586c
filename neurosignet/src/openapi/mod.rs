//! OpenAPI documentation for the HTTP API.
//!
//! [`ApiDoc`] covers the JSON endpoints under `/api`. The WebSocket progress channel cannot be
//! described by OpenAPI directly, so it is documented through a stub operation whose schemas are
//! the frames exchanged on the socket.

use utoipa::OpenApi;

use crate::api;
use crate::api::models::progress::{ClientMessage, ServerMessage};

// ============================================================================
// Stub handlers (documentation only)
// ============================================================================

/// Progress channel.
#[utoipa::path(
    get,
    path = "/ws/progress",
    tag = "progress",
    summary = "Progress WebSocket",
    description = "Upgrade to a WebSocket, then send a `subscribe_progress` frame. The server replies with \
                   `progress_update` frames from 0 to 100, one per interval. A frame that cannot be parsed \
                   is answered with an `error` frame and the connection stays open.",
    responses(
        (status = 101, description = "Switching to the WebSocket protocol", body = ServerMessage),
        (status = 400, description = "Not a WebSocket upgrade request"),
    )
)]
#[allow(unused)]
fn progress_channel() {}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NeuroSigNet Pro API",
        description = "Document upload and analysis: signature and seal detection with quality enhancement."
    ),
    paths(
        api::handlers::health::health_check,
        api::handlers::analyze::analyze_document,
        api::handlers::analyze::batch_analyze,
        api::handlers::history::get_history,
        progress_channel,
    ),
    components(
        schemas(
            api::models::health::HealthResponse,
            api::models::analysis::AnalyzeForm,
            api::models::analysis::BatchAnalyzeForm,
            api::models::analysis::AnalyzeResponse,
            api::models::analysis::BatchAnalyzeResponse,
            api::models::analysis::DocumentOutcome,
            api::models::history::HistoryResponse,
            crate::processing::AnalysisResult,
            crate::processing::DocumentAnalysis,
            crate::types::AnalysisOptions,
            crate::errors::ErrorBody,
            ClientMessage,
            ServerMessage,
            api::models::progress::ProgressStatus,
        )
    ),
    tags(
        (name = "system", description = "Service health"),
        (name = "analysis", description = "Document upload and analysis"),
        (name = "progress", description = "Live progress over WebSocket"),
    )
)]
pub struct ApiDoc;
