use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid url")]
    InvalidRequest,

    #[error("OpenRouter API key(s) not configured")]
    NotConfigured,

    #[error("Content fetch blocked or unavailable for this URL. Try again later or use a different source.")]
    FetchBlocked(String),

    #[error("No readable content extracted from this URL. The site may prevent scraping.")]
    NoContent,

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("All free models failed or rate-limited. Please try again in a few minutes. Last error: {0}")]
    ModelsExhausted(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Machine-readable code for the two failure modes the dashboard
    /// distinguishes in its UI.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::FetchBlocked(_) => Some("FETCH_BLOCKED"),
            AppError::NoContent => Some("NO_CONTENT"),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest => StatusCode::BAD_REQUEST,
            AppError::NoContent => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FetchBlocked(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConfigured
            | AppError::Summarization(_)
            | AppError::ModelsExhausted(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
