use crate::cache::cache_key;
use crate::config::ModelInfo;
use crate::error::{AppError, Result};
use crate::search::SourceResult;
use crate::AppState;

/// Everything a completed search hands back to the entry layer.
pub struct SearchOutcome {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceResult>,
    pub model_info: ModelInfo,
    pub rate_limit_remaining: usize,
}

/// Orchestrate one search request: validate, rate-limit, resolve the
/// session's backend, fetch sources through the cache, synthesize an
/// answer, and log the query. Only validation and rate-limit conditions
/// surface as errors; provider failures are absorbed downstream.
pub async fn run_search(state: &AppState, raw_query: &str, identity: &str) -> Result<SearchOutcome> {
    let query = raw_query.trim();
    if query.is_empty() {
        return Err(AppError::EmptyQuery);
    }

    let (allowed, _) = state.rate_limiter.check(identity);
    if !allowed {
        return Err(AppError::RateLimited);
    }
    state.rate_limiter.record(identity);

    let mode = state.sessions.mode(identity);
    let model_info = state.config.model_info(mode);

    let max_results = state.config.max_search_results;
    let key = cache_key("search_web", &[query, &max_results.to_string()]);
    let search = &state.search;
    let sources = state
        .cache
        .get_or_compute(&key, state.config.cache_duration, || async move {
            search.search(query, max_results).await
        })
        .await;

    let answer = state.generator.generate(query, &sources, mode).await;

    state.history.push(query, mode);

    let (_, remaining) = state.rate_limiter.check(identity);

    Ok(SearchOutcome {
        query: query.to_string(),
        answer,
        sources,
        model_info,
        rate_limit_remaining: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn test_state() -> AppState {
        AppState::new(Config {
            server_addr: "127.0.0.1:3000".parse().unwrap(),
            serper_api_key: None,
            groq_api_key: None,
            openai_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            local_model: "llama2".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            cache_duration: Duration::from_secs(3600),
            max_history: 10,
            rate_limit_searches: 50,
            rate_limit_window: Duration::from_secs(3600),
            max_search_results: 5,
        })
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_consuming_anything() {
        let state = test_state();

        for raw in ["", "   ", "\t\n"] {
            let result = run_search(&state, raw, "alice").await;
            assert!(matches!(result, Err(AppError::EmptyQuery)));
        }

        assert!(state.history.is_empty());
        assert_eq!(state.rate_limiter.check("alice"), (true, 50));
    }

    #[tokio::test]
    async fn exhausted_identity_is_rate_limited_without_side_effects() {
        let state = test_state();
        for _ in 0..50 {
            state.rate_limiter.record("bob");
        }

        let result = run_search(&state, "capital of France", "bob").await;
        assert!(matches!(result, Err(AppError::RateLimited)));
        assert!(state.history.is_empty());
    }
}
