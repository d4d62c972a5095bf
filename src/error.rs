use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the upstream service adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("upstream returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Http(e.to_string())
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The caller supplied insufficient input.
    #[error("{0}")]
    Validation(String),
    /// A required credential is not set.
    #[error("{0} is not configured")]
    Config(&'static str),
    /// A required upstream response could not be interpreted.
    #[error("{0}")]
    UpstreamParse(String),
    /// A required upstream call failed or returned non-success.
    #[error("{0}")]
    Upstream(String),
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

/// Unreadable bodies (wrong content type, bad JSON, wrong field types) are caller errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::UpstreamParse(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Upstream messages go to the caller as-is
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        assert_eq!(AppError::Validation("Idea is required".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_is_internal() {
        assert_eq!(AppError::Config("GROQ_API_KEY").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::UpstreamParse("bad".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Upstream("502".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn config_message_names_the_variable() {
        assert_eq!(
            AppError::Config("HUGGINGFACE_API_KEY").to_string(),
            "HUGGINGFACE_API_KEY is not configured"
        );
    }

    #[test]
    fn client_errors_become_upstream_errors() {
        let err: AppError = ClientError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "model loading".into(),
        }
        .into();
        assert!(matches!(err, AppError::Upstream(ref m) if m.contains("503") && m.contains("model loading")));
    }
}
