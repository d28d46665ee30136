pub mod api;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod summarize;

use std::sync::Arc;
use cache::SummaryCache;
use config::Config;
use llm::OpenRouter;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<SummaryCache>,
    pub llm: Arc<OpenRouter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm = OpenRouter::new(&config.referer);
        Self {
            config: Arc::new(config),
            cache: Arc::new(SummaryCache::new()),
            llm: Arc::new(llm),
        }
    }

    /// State with a caller-supplied OpenRouter client (tests point it
    /// at a stub endpoint).
    pub fn with_llm(config: Config, llm: OpenRouter) -> Self {
        Self {
            config: Arc::new(config),
            cache: Arc::new(SummaryCache::new()),
            llm: Arc::new(llm),
        }
    }
}
