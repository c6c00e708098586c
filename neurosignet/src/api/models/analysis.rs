use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ErrorBody;
use crate::processing::AnalysisResult;
use crate::types::TaskId;

/// Multipart form accepted by `POST /api/v1/analyze` (documentation only)
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AnalyzeForm {
    /// The document to analyze
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Enhance document quality (default: true)
    pub enhance_quality: Option<bool>,
    /// Detect handwritten signatures (default: true)
    pub detect_signatures: Option<bool>,
    /// Detect seals and stamps (default: true)
    pub detect_seals: Option<bool>,
    /// Language hint (default: "auto")
    pub language: Option<String>,
}

/// Multipart form accepted by `POST /api/v1/batch-analyze` (documentation only)
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct BatchAnalyzeForm {
    /// One part per document; `file` is accepted as an alias
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}

/// Successful analysis of a single document
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    /// Always `true`
    pub success: bool,
    #[schema(value_type = String, format = Uuid)]
    pub task_id: TaskId,
    pub result: AnalysisResult,
}

impl AnalyzeResponse {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            success: true,
            task_id: result.task_id,
            result,
        }
    }
}

/// Outcome of one document inside a batch
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Completed(AnalyzeResponse),
    Failed(ErrorBody),
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DocumentOutcome::Completed(_))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchAnalyzeResponse {
    /// `true` once the batch has been walked, even if individual documents failed
    pub success: bool,
    /// Identifier of the batch envelope
    #[schema(value_type = String, format = Uuid)]
    pub task_id: TaskId,
    /// Number of entries in `results`
    pub processed_files: usize,
    pub results: Vec<DocumentOutcome>,
}
