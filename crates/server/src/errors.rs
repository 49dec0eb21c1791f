use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use consultkit::{ExportError, PipelineError};
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from generation, refinement, and chart rendering.
    Pipeline(PipelineError),
    /// Errors from the document exporters.
    Export(ExportError),
    /// The request body could not be parsed into the expected payload.
    Rejection(JsonRejection),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::Rejection(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl AppError {
    /// The status code and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Pipeline(err) => {
                let status = match err {
                    PipelineError::Provider(_) => StatusCode::BAD_GATEWAY,
                    PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    PipelineError::Extraction(_)
                    | PipelineError::Chart(_)
                    | PipelineError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            AppError::Export(err) => {
                let status = match err {
                    ExportError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            AppError::Rejection(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = self.status_and_message();
        // Log the original error for debugging purposes
        error!(status = %status_code, "Request failed: {:?}", self);

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consultkit::errors::{ExtractionError, ProviderError};

    #[test]
    fn provider_failures_are_bad_gateway() {
        let err = AppError::from(PipelineError::Provider(ProviderError::AiApi {
            status: 401,
            body: "bad key".into(),
        }));
        assert_eq!(err.status_and_message().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn extraction_failures_are_internal_errors() {
        let err = AppError::from(PipelineError::Extraction(ExtractionError::NoMapping));
        assert_eq!(err.status_and_message().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn transport_failures_do_not_reveal_the_api_key() {
        use consultkit::providers::ai::{gemini::GeminiProvider, AiProvider};

        let provider = GeminiProvider::new(
            "http://127.0.0.1:1/v1beta".to_string(),
            "SECRETKEY123".to_string(),
        )
        .unwrap();
        let err = provider
            .generate("gemini-2.5-flash", "Hello", true)
            .await
            .unwrap_err();

        let (status, message) = AppError::from(PipelineError::from(err)).status_and_message();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!message.contains("SECRETKEY123"), "{message}");
    }

    #[test]
    fn unsupported_format_is_bad_request() {
        let (status, message) =
            AppError::from(ExportError::UnsupportedFormat("rtf".into())).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("rtf"));
    }
}
