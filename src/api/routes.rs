use axum::{
    routing::post,
    Router,
    extract::{Json, State},
};
use tower_http::cors::{CorsLayer, Any};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::models::{SummarizeRequest, SummarizeResponse};
use crate::error::{AppError, Result};
use crate::summarize::summarize_url;
use crate::AppState;

/// Everything a request is allowed to spend across fetch, extraction
/// and the full model fallback walk.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(90);

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/summarize", post(summarize_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn summarize_handler(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>> {
    info!(url = %req.url, "summarize request");

    let outcome = tokio::time::timeout(HANDLER_TIMEOUT, summarize_url(&state, &req.url))
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Summarization(
                "request processing timed out".to_string(),
            ))
        });

    match outcome {
        Ok(summary) => Ok(Json(summary.into())),
        Err(err) => {
            warn!(url = %req.url, error = %err, "summarize failed");
            Err(err)
        }
    }
}
