//! # Template Handlers
//!
//! Generation and refinement. Text responses are streamed to the client as
//! the model produces them; graph visualizations return a PNG.

use super::{AppError, AppState};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use consultkit::{
    providers::ai::TextStream, GenerateTemplateRequest, RefineTemplateRequest, RefinementOutput,
};
use futures::TryStreamExt;
use tracing::{error, info};

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const PNG_CONTENT_TYPE: &str = "image/png";

/// Relays model fragments as a chunked `text/plain` body.
///
/// A provider error mid-stream aborts the body; fragments already sent stay sent.
fn stream_response(stream: TextStream) -> Response {
    let stream = stream.inspect_err(|e| error!("Model stream failed mid-response: {e}"));
    (
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Handler for `/generate-template` (and its `/template` alias).
pub async fn generate_template_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<GenerateTemplateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    info!(
        "Received generate-template request for '{}'",
        request.company_name
    );
    let stream = app_state.pipeline.generate(&request).await?;
    Ok(stream_response(stream))
}

/// Handler for `/refine-template`.
pub async fn refine_template_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RefineTemplateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    info!(
        "Received refine-template request with option '{}'",
        request.refinement_option
    );
    match app_state.pipeline.refine(&request).await? {
        RefinementOutput::Stream(stream) => Ok(stream_response(stream)),
        RefinementOutput::Chart(png) => {
            Ok(([(header::CONTENT_TYPE, PNG_CONTENT_TYPE)], png).into_response())
        }
    }
}
