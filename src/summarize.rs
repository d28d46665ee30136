use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use crate::AppState;
use crate::cache::{default_ttl, CachedSummary};
use crate::content::{extract_or_fallback, fetch_html};
use crate::error::{AppError, Result};

/// A produced (or replayed) summary for one URL.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub title: String,
    pub excerpt: String,
    pub summary: String,
    pub cached: bool,
}

/// Runs the whole pipeline for one URL: cache lookup, fetch, extract,
/// model fallback, cache store. Failures are never cached.
pub async fn summarize_url(state: &AppState, url: &str) -> Result<Summary> {
    if url.trim().is_empty() {
        return Err(AppError::InvalidRequest);
    }

    if let Some(hit) = state.cache.get(url) {
        info!(url, "cache hit");
        return Ok(Summary {
            title: hit.title,
            excerpt: hit.excerpt,
            summary: hit.summary,
            cached: true,
        });
    }

    if state.config.api_keys.is_empty() {
        warn!("no OpenRouter API keys configured");
        return Err(AppError::NotConfigured);
    }

    let html = fetch_html(url).await?;
    let extracted = extract_or_fallback(&html, url)?;

    let summary = state
        .llm
        .summarize(&extracted, url, &state.config.api_keys)
        .await?;

    state.cache.put(
        url.to_string(),
        CachedSummary {
            title: extracted.title.clone(),
            excerpt: extracted.excerpt.clone(),
            summary: summary.clone(),
        },
        default_ttl(),
    );

    Ok(Summary {
        title: extracted.title,
        excerpt: extracted.excerpt,
        summary,
        cached: false,
    })
}

/// Summarizes several URLs concurrently, one independent pipeline run
/// per URL. Every outcome is collected; a failed branch neither cancels
/// nor hides the others.
pub async fn summarize_many(
    state: &AppState,
    urls: &[String],
) -> Vec<(String, Result<Summary>)> {
    let tasks = urls.iter().map(|url| async move {
        let outcome = summarize_url(state, url).await;
        if let Err(err) = &outcome {
            warn!(url = %url, error = %err, "summarization failed");
        }
        (url.clone(), outcome)
    });
    join_all(tasks).await
}
