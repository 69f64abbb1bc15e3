use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use common::error::AppError;
use ingestion_pipeline::UploadedFile;
use tracing::info;
use uuid::Uuid;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct CompareParams {
    // Request size is capped by the route's body limit.
    #[form_data(limit = "unlimited")]
    pub reference: FieldData<Bytes>,
    #[form_data(limit = "unlimited")]
    pub actual: FieldData<Bytes>,
}

pub async fn compare_documents(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<CompareParams>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = Uuid::new_v4();
    let reference = into_upload(input.reference)?;
    let actual = into_upload(input.actual)?;

    info!(
        job_id = %job_id,
        reference = %reference.file_name,
        reference_bytes = reference.bytes.len(),
        actual = %actual.file_name,
        actual_bytes = actual.bytes.len(),
        "Received comparison request"
    );

    let _job = state.job_lock.lock().await;

    state.ingestion.stage(reference, actual).await?;
    let combined = state.ingestion.combine().await?;
    let table = state.comparer.compare(&combined).await?;

    info!(job_id = %job_id, rows = table.rows.len(), "Comparison finished");

    Ok((StatusCode::OK, Json(table.to_json_rows())))
}

fn into_upload(field: FieldData<Bytes>) -> Result<UploadedFile, AppError> {
    let file_name = field
        .metadata
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Uploaded file is missing a file name".to_string()))?;

    Ok(UploadedFile::new(file_name, field.contents))
}
