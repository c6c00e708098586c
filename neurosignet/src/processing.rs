//! Document analysis engine.
//!
//! Handlers talk to the engine through [`DocumentProcessor`] so a real detector can replace the
//! [`SimulatedProcessor`], which waits for a configured delay and reports fixed findings.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::errors::Result;
use crate::storage::StoredUpload;
use crate::types::{AnalysisOptions, TaskId};

/// Signatures reported when signature detection is enabled
pub const SIMULATED_SIGNATURES: u32 = 2;
/// Seals reported when seal detection is enabled
pub const SIMULATED_SEALS: u32 = 1;
pub const SIMULATED_CONFIDENCE: f64 = 0.95;
pub const SIMULATED_DOCUMENT_TYPE: &str = "contract";

/// Engine level details of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentAnalysis {
    /// Overall confidence in the findings, 0.0 to 1.0
    pub confidence: f64,
    /// Wall-clock processing time, e.g. `2.0s`
    pub processing_time: String,
    /// Detected document category
    pub document_type: String,
}

/// Findings for a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    #[schema(value_type = String, format = Uuid)]
    pub task_id: TaskId,
    pub filename: String,
    pub processed: bool,
    pub signatures_found: u32,
    pub seals_found: u32,
    pub quality_enhanced: bool,
    pub analysis: DocumentAnalysis,
}

#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Analyze a stored document
    async fn process(&self, upload: &StoredUpload, options: &AnalysisOptions) -> Result<AnalysisResult>;
}

/// Placeholder engine: sleeps for `delay`, then reports constant findings filtered by the
/// requested options. The document content is never read.
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DocumentProcessor for SimulatedProcessor {
    #[instrument(skip_all, fields(task_id = %upload.task_id, filename = %upload.filename))]
    async fn process(&self, upload: &StoredUpload, options: &AnalysisOptions) -> Result<AnalysisResult> {
        let started = Instant::now();
        tokio::time::sleep(self.delay).await;
        let elapsed = started.elapsed();

        metrics::counter!("neurosignet_documents_processed_total", "engine" => "simulated").increment(1);
        metrics::histogram!("neurosignet_processing_duration_seconds", "engine" => "simulated").record(elapsed.as_secs_f64());

        debug!(language = %options.language, elapsed = ?elapsed, "Simulated analysis finished");

        Ok(AnalysisResult {
            task_id: upload.task_id,
            filename: upload.filename.clone(),
            processed: true,
            signatures_found: if options.detect_signatures { SIMULATED_SIGNATURES } else { 0 },
            seals_found: if options.detect_seals { SIMULATED_SEALS } else { 0 },
            quality_enhanced: options.enhance_quality,
            analysis: DocumentAnalysis {
                confidence: SIMULATED_CONFIDENCE,
                processing_time: format_processing_time(elapsed),
                document_type: SIMULATED_DOCUMENT_TYPE.to_string(),
            },
        })
    }
}

/// Seconds with one decimal place, e.g. `2.1s`
pub fn format_processing_time(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn upload() -> StoredUpload {
        StoredUpload {
            task_id: Uuid::new_v4(),
            filename: "contract.pdf".to_string(),
            path: PathBuf::from("/nonexistent/contract.pdf"),
            size_bytes: 42,
        }
    }

    #[test]
    fn test_format_processing_time() {
        assert_eq!(format_processing_time(Duration::from_millis(2100)), "2.1s");
        assert_eq!(format_processing_time(Duration::ZERO), "0.0s");
        assert_eq!(format_processing_time(Duration::from_millis(49)), "0.0s");
    }

    #[tokio::test]
    async fn test_all_detections_enabled() {
        let processor = SimulatedProcessor::new(Duration::ZERO);
        let upload = upload();

        let result = processor.process(&upload, &AnalysisOptions::default()).await.unwrap();

        assert_eq!(result.task_id, upload.task_id);
        assert_eq!(result.filename, "contract.pdf");
        assert!(result.processed);
        assert_eq!(result.signatures_found, 2);
        assert_eq!(result.seals_found, 1);
        assert!(result.quality_enhanced);
        assert_eq!(result.analysis.confidence, 0.95);
        assert_eq!(result.analysis.document_type, "contract");
        assert!(result.analysis.processing_time.ends_with('s'));
    }

    #[tokio::test]
    async fn test_flags_zero_out_counts() {
        let processor = SimulatedProcessor::new(Duration::ZERO);
        let options = AnalysisOptions {
            enhance_quality: false,
            detect_signatures: false,
            detect_seals: false,
            language: "de".to_string(),
        };

        let result = processor.process(&upload(), &options).await.unwrap();

        assert_eq!(result.signatures_found, 0);
        assert_eq!(result.seals_found, 0);
        assert!(!result.quality_enhanced);
        // Confidence does not depend on the flags
        assert_eq!(result.analysis.confidence, 0.95);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_observed() {
        let processor = SimulatedProcessor::new(Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let result = processor.process(&upload(), &AnalysisOptions::default()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(result.processed);
    }
}
