use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Incomplete data: {0}")]
    IncompleteData(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    /// Message safe to show to an end user. Raw model text and parser
    /// diagnostics stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Configuration(_) => {
                "The service is not configured with an API credential. \
                 Set GEMINI_API_KEY and restart."
                    .to_string()
            }
            AppError::ContentBlocked(_) => {
                "The analysis was blocked by the provider's content filters. \
                 Try a different company name."
                    .to_string()
            }
            AppError::MalformedResponse(_) | AppError::IncompleteData(_) => {
                "The analysis service returned an unusable response. Please try again."
                    .to_string()
            }
            AppError::Upstream(_) => {
                "The analysis service is currently unavailable. Please try again."
                    .to_string()
            }
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ContentBlocked(msg) => {
                tracing::warn!(error = %msg, "Generation blocked");
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::MalformedResponse(detail) => {
                tracing::error!(error = %detail, "Malformed model response");
                StatusCode::BAD_GATEWAY
            }
            AppError::IncompleteData(detail) => {
                tracing::error!(error = %detail, "Incomplete report data");
                StatusCode::BAD_GATEWAY
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream error");
                StatusCode::BAD_GATEWAY
            }
        };

        let error_message = self.user_message();

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
