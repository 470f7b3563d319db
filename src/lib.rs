pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod rate_limit;
pub mod search;
pub mod session;

use std::sync::Arc;

use cache::ResultCache;
use config::Config;
use history::SearchHistory;
use llm::AnswerGenerator;
use rate_limit::RateLimiter;
use search::{SourceResult, WebSearch};
use session::SessionStore;

/// Application state that will be shared across handlers. All process-wide
/// state lives here; nothing is persisted across restarts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub search: Arc<WebSearch>,
    pub generator: Arc<AnswerGenerator>,
    pub cache: Arc<ResultCache<Vec<SourceResult>>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub history: Arc<SearchHistory>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        AppState {
            search: Arc::new(WebSearch::new(config.serper_api_key.clone())),
            generator: Arc::new(AnswerGenerator::new(config.clone())),
            cache: Arc::new(ResultCache::new()),
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_searches,
                config.rate_limit_window,
            )),
            history: Arc::new(SearchHistory::new(config.max_history)),
            sessions: Arc::new(SessionStore::new()),
            config,
        }
    }
}
