//! # Export Handler

use super::{AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use consultkit::ExportTemplateRequest;
use tracing::info;

/// Handler for `/export-template`: returns the rendered file as an attachment.
pub async fn export_template_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<ExportTemplateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    info!("Received export-template request for format '{}'", request.format);

    let document = app_state
        .exporter
        .export(&request.template, &request.format)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, document.media_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename),
        ),
    ];
    Ok((headers, document.bytes).into_response())
}
