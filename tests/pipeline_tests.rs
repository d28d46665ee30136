use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Duration as ChronoDuration;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use link_dashboard_api::api::routes::create_router;
use link_dashboard_api::cache::CachedSummary;
use link_dashboard_api::config::Config;
use link_dashboard_api::error::AppError;
use link_dashboard_api::llm::OpenRouter;
use link_dashboard_api::summarize::{summarize_many, summarize_url};
use link_dashboard_api::AppState;

const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Field Notes</title>
<meta name="description" content="Notes from running a small service."></head>
<body>
<article>
<h1>Field Notes</h1>
<p>The service started as a weekend experiment and ended up carrying real
traffic within a month. Most of the early work went into unglamorous things:
timeouts, retries, and making sure a single slow upstream could not stall the
whole request path. None of it was novel, all of it was necessary.</p>
<p>The second month was about observability. Every request now carries enough
context in its log lines to reconstruct what happened without guessing, and
the few times something truly broke, the fix was found by reading logs rather
than by reproducing the failure locally.</p>
<p>If there is one lesson worth repeating, it is that boring infrastructure
choices age well. The pieces that caused trouble were invariably the clever
ones, and the pieces nobody ever thinks about were the ones quietly doing
their job the entire time.</p>
</article>
</body>
</html>"#;

const BARE_HTML: &str =
    "<!DOCTYPE html><html><head><title></title></head><body><div></div></body></html>";

#[derive(Clone)]
struct SiteState {
    fetches: Arc<AtomicUsize>,
}

async fn article(State(s): State<SiteState>) -> Html<&'static str> {
    s.fetches.fetch_add(1, Ordering::SeqCst);
    Html(ARTICLE_HTML)
}

async fn sparse() -> Html<&'static str> {
    Html(BARE_HTML)
}

async fn blocked() -> (StatusCode, &'static str) {
    (StatusCode::FORBIDDEN, "scraping not welcome here")
}

/// Stand-in for the origin site being summarized. Returns the base URL
/// and a counter of article fetches.
async fn spawn_site() -> (String, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/article", get(article))
        .route("/second-article", get(article))
        .route("/sparse", get(sparse))
        .route("/blocked", get(blocked))
        .with_state(SiteState {
            fetches: fetches.clone(),
        });
    (serve(router).await, fetches)
}

#[derive(Clone)]
struct ModelState {
    calls: Arc<AtomicUsize>,
}

async fn chat_completions(State(s): State<ModelState>, Json(_body): Json<Value>) -> Json<Value> {
    s.calls.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": "A concise summary of the page."}}]
    }))
}

/// Stand-in for the OpenRouter endpoint; always succeeds and counts calls.
async fn spawn_model_endpoint() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(ModelState {
            calls: calls.clone(),
        });
    let base = serve(router).await;
    (format!("{}/chat/completions", base), calls)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn test_state(keys: &[&str], endpoint: &str) -> AppState {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        api_keys: keys.iter().map(|k| k.to_string()).collect(),
        referer: "http://localhost:3000".to_string(),
    };
    let llm = OpenRouter::new(&config.referer)
        .with_endpoint(endpoint)
        .with_models(vec!["test-model".to_string()])
        .with_retry_delay(Duration::ZERO);
    AppState::with_llm(config, llm)
}

#[tokio::test]
async fn blocked_fetch_never_reaches_the_model() {
    let (site, _) = spawn_site().await;
    let (endpoint, model_calls) = spawn_model_endpoint().await;
    let state = test_state(&["key-1"], &endpoint);

    let err = summarize_url(&state, &format!("{}/blocked", site))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::FetchBlocked(_)));
    assert_eq!(model_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_page_is_no_content() {
    let (site, _) = spawn_site().await;
    let (endpoint, model_calls) = spawn_model_endpoint().await;
    let state = test_state(&["key-1"], &endpoint);

    let err = summarize_url(&state, &format!("{}/sparse", site))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoContent));
    assert_eq!(model_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_key_pool_is_not_configured() {
    let (site, fetches) = spawn_site().await;
    let (endpoint, _) = spawn_model_endpoint().await;
    let state = test_state(&[], &endpoint);

    let err = summarize_url(&state, &format!("{}/article", site))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotConfigured));
    // Rejected before any outbound work
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_call_within_ttl_is_served_from_cache() {
    let (site, fetches) = spawn_site().await;
    let (endpoint, model_calls) = spawn_model_endpoint().await;
    let state = test_state(&["key-1"], &endpoint);
    let url = format!("{}/article", site);

    let first = summarize_url(&state, &url).await.unwrap();
    assert!(!first.cached);

    let second = summarize_url(&state, &url).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.title, first.title);
    assert_eq!(second.excerpt, first.excerpt);
    assert_eq!(second.summary, first.summary);

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(model_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_entry_triggers_a_fresh_fetch() {
    let (site, fetches) = spawn_site().await;
    let (endpoint, model_calls) = spawn_model_endpoint().await;
    let state = test_state(&["key-1"], &endpoint);
    let url = format!("{}/article", site);

    summarize_url(&state, &url).await.unwrap();

    // Age the entry past its expiry instant
    state.cache.put(
        url.clone(),
        CachedSummary {
            title: "stale".to_string(),
            excerpt: "stale".to_string(),
            summary: "stale".to_string(),
        },
        ChronoDuration::milliseconds(-1),
    );

    let third = summarize_url(&state, &url).await.unwrap();
    assert!(!third.cached);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(model_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fan_out_collects_every_outcome() {
    let (site, _) = spawn_site().await;
    let (endpoint, _) = spawn_model_endpoint().await;
    let state = test_state(&["key-1"], &endpoint);

    let urls = vec![
        format!("{}/article", site),
        format!("{}/blocked", site),
        format!("{}/second-article", site),
    ];
    let outcomes = summarize_many(&state, &urls).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].1.is_ok());
    assert!(matches!(outcomes[1].1, Err(AppError::FetchBlocked(_))));
    assert!(outcomes[2].1.is_ok());
    // Outcomes stay paired with their URLs
    assert_eq!(outcomes[1].0, urls[1]);
}

/// Serves the real router and exercises it over HTTP.
async fn spawn_app(state: AppState) -> String {
    serve(create_router(state)).await
}

#[tokio::test]
async fn http_success_and_cached_replay() {
    let (site, _) = spawn_site().await;
    let (endpoint, _) = spawn_model_endpoint().await;
    let app = spawn_app(test_state(&["key-1"], &endpoint)).await;
    let client = reqwest::Client::new();
    let url = format!("{}/article", site);

    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({ "url": url }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["summary"], "A concise summary of the page.");
    assert!(body.get("cached").is_none(), "cached omitted on a miss");

    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({ "url": url }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["cached"], true);
}

#[tokio::test]
async fn http_error_statuses_and_codes() {
    let (site, _) = spawn_site().await;
    let (endpoint, _) = spawn_model_endpoint().await;
    let app = spawn_app(test_state(&["key-1"], &endpoint)).await;
    let client = reqwest::Client::new();

    // Missing url -> 400
    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // Blocked origin -> 502 with FETCH_BLOCKED
    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({ "url": format!("{}/blocked", site) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "FETCH_BLOCKED");

    // Unreadable page -> 422 with NO_CONTENT
    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({ "url": format!("{}/sparse", site) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 422);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "NO_CONTENT");
}

#[tokio::test]
async fn http_not_configured_is_a_server_error() {
    let (site, _) = spawn_site().await;
    let (endpoint, _) = spawn_model_endpoint().await;
    let app = spawn_app(test_state(&[], &endpoint)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/summarize", app))
        .json(&serde_json::json!({ "url": format!("{}/article", site) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 500);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}
