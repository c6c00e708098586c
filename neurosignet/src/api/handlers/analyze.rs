//! HTTP handlers for document upload and analysis.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::AppState;
use crate::api::models::analysis::{AnalyzeForm, AnalyzeResponse, BatchAnalyzeForm, BatchAnalyzeResponse, DocumentOutcome};
use crate::errors::{Error, ErrorBody, Result};
use crate::storage::{StoredUpload, UploadStore};
use crate::types::{AnalysisOptions, TaskId, parse_form_bool};

fn multipart_error(e: MultipartError, context: &str) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: format!("Request body too large: {}", e.body_text()),
        }
    } else {
        Error::BadRequest {
            message: format!("{context}: {}", e.body_text()),
        }
    }
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| multipart_error(e, &format!("Failed to read {name}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    parse_form_bool(raw).ok_or_else(|| Error::BadRequest {
        message: format!("Invalid value '{raw}' for {name}: expected a boolean"),
    })
}

/// Stream one multipart file field to disk under a fresh task id.
async fn receive_document(store: &UploadStore, mut field: Field<'_>) -> Result<StoredUpload> {
    let task_id: TaskId = Uuid::new_v4();
    let filename = store.accept_filename(field.file_name())?;

    info!(task_id = %task_id, filename = %filename, "Starting document upload");

    let mut pending = store.create(task_id, &filename).await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, "Failed to read file chunk"))?
    {
        pending.write_chunk(&chunk).await?;
    }
    pending.finish().await
}

/// Run the engine on a stored document, discarding the file if the engine fails.
async fn analyze_stored(state: &AppState, upload: &StoredUpload, options: &AnalysisOptions) -> Result<AnalyzeResponse> {
    match state.processor.process(upload, options).await {
        Ok(result) => Ok(AnalyzeResponse::new(result)),
        Err(e) => {
            state.store.discard(upload).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/analyze",
    tag = "analysis",
    summary = "Analyze document",
    description = "Upload a single document and run signature, seal and quality analysis on it.",
    request_body(content = AnalyzeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document analyzed", body = AnalyzeResponse),
        (status = 400, description = "Invalid form data", body = ErrorBody),
        (status = 413, description = "Document too large", body = ErrorBody),
        (status = 415, description = "Unsupported document format", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn analyze_document(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<AnalyzeResponse>> {
    let mut options = AnalysisOptions::from(&state.config.processing);
    let mut upload: Option<StoredUpload> = None;

    let parsed: Result<()> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "Failed to parse multipart data"))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "file" => {
                    if upload.is_some() {
                        return Err(Error::BadRequest {
                            message: "Only one file may be uploaded; use /api/v1/batch-analyze for several".to_string(),
                        });
                    }
                    upload = Some(receive_document(&state.store, field).await?);
                }
                "enhance_quality" => options.enhance_quality = parse_flag(&field_name, &read_text(field, &field_name).await?)?,
                "detect_signatures" => options.detect_signatures = parse_flag(&field_name, &read_text(field, &field_name).await?)?,
                "detect_seals" => options.detect_seals = parse_flag(&field_name, &read_text(field, &field_name).await?)?,
                "language" => {
                    let language = read_text(field, &field_name).await?;
                    let language = language.trim();
                    options.language = if language.is_empty() { "auto".to_string() } else { language.to_string() };
                }
                _ => {
                    // Ignore unknown fields (forward compatibility)
                }
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        if let Some(stored) = &upload {
            state.store.discard(stored).await;
        }
        return Err(e);
    }

    let upload = upload.ok_or_else(|| Error::BadRequest {
        message: "Missing required field: 'file'".to_string(),
    })?;

    let response = analyze_stored(&state, &upload, &options).await?;

    info!(
        task_id = %response.task_id,
        signatures = response.result.signatures_found,
        seals = response.result.seals_found,
        "Document analyzed"
    );

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/batch-analyze",
    tag = "analysis",
    summary = "Analyze documents in batch",
    description = "Upload several documents at once. Each is analyzed with every detection enabled; \
                   a document that fails is reported in place and the rest of the batch continues.",
    request_body(content = BatchAnalyzeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch processed", body = BatchAnalyzeResponse),
        (status = 400, description = "No documents supplied or malformed form data", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn batch_analyze(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<BatchAnalyzeResponse>> {
    let batch_id: TaskId = Uuid::new_v4();
    let options = AnalysisOptions::default();
    let max_files = state.config.limits.max_batch_files;
    let mut results: Vec<DocumentOutcome> = Vec::new();

    info!(batch_id = %batch_id, "Starting batch analysis");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to parse multipart data"))?
    {
        if !matches!(field.name(), Some("files") | Some("file")) {
            continue;
        }

        if results.len() >= max_files {
            warn!(batch_id = %batch_id, max_files, "Batch file limit exceeded, skipping document");
            results.push(DocumentOutcome::Failed(
                Error::BadRequest {
                    message: format!("Batch limit of {max_files} files exceeded"),
                }
                .body(),
            ));
            continue;
        }

        let outcome = match receive_document(&state.store, field).await {
            Ok(upload) => analyze_stored(&state, &upload, &options).await,
            Err(e) => Err(e),
        };

        results.push(match outcome {
            Ok(response) => DocumentOutcome::Completed(response),
            Err(e) => {
                e.log();
                DocumentOutcome::Failed(e.body())
            }
        });
    }

    if results.is_empty() {
        return Err(Error::BadRequest {
            message: "At least one file is required".to_string(),
        });
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        batch_id = %batch_id,
        processed_files = results.len(),
        succeeded,
        "Batch analysis finished"
    );

    Ok(Json(BatchAnalyzeResponse {
        success: true,
        task_id: batch_id,
        processed_files: results.len(),
        results,
    }))
}
