use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::errors::Error;
use crate::processing::AnalysisResult;

/// Default page size for the history listing.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for the history listing.
pub const MAX_LIMIT: i64 = 100;

/// Page-based pagination for the processing history.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Items per page (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl HistoryQuery {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Rejects malformed parameters with the standard error body instead of axum's plain text.
impl<S: Send + Sync> FromRequestParts<S> for HistoryQuery {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HistoryQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| Error::BadRequest {
                message: format!("Invalid pagination parameters: {}", e.body_text()),
            })?;
        Ok(query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub page: i64,
    pub limit: i64,
    /// Total number of entries across all pages
    pub total: i64,
    pub results: Vec<AnalysisResult>,
}
