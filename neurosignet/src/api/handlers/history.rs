//! HTTP handler for the processing history.

use axum::Json;

use crate::api::models::history::{HistoryQuery, HistoryResponse};
use crate::errors::ErrorBody;

/// Analysis results are not persisted, so every page is empty.
#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "analysis",
    summary = "Processing history",
    description = "Paginated list of past analyses. Results are not retained, so the list is always empty.",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History page", body = HistoryResponse),
        (status = 400, description = "Invalid pagination parameters", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_history(query: HistoryQuery) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        page: query.page(),
        limit: query.limit(),
        total: 0,
        results: Vec::new(),
    })
}
