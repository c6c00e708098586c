use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` while the process is serving
    pub status: String,
    /// Service version
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
