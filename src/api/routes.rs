use axum::{
    routing::{get, post},
    Router,
    extract::{Form, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_http::cors::{CorsLayer, Any};
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::api::models::{
    ActionResponse, HistoryResponse, SearchRequest, SearchResponse, StatsResponse,
    SwitchModeRequest, SwitchModeResponse,
};
use crate::llm::BackendMode;
use crate::pipeline::run_search;
use crate::session;
use crate::AppState;

const SESSION_COOKIE: &str = "session_id";

// Overall handler deadline; individual provider calls enforce their own
// shorter timeouts.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(90);

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/search", post(search_handler))
        .route("/switch_mode", post(switch_mode_handler))
        .route("/history", get(history_handler))
        .route("/clear_cache", post(clear_cache_handler))
        .route("/clear_history", post(clear_history_handler))
        .route("/stats", get(stats_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Read the session identity from the cookie jar, minting one lazily on a
/// client's first interaction.
fn ensure_identity(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let identity = cookie.value().to_string();
        return (jar, identity);
    }

    let identity = session::new_identity();
    let jar = jar.add(Cookie::new(SESSION_COOKIE, identity.clone()));
    (jar, identity)
}

async fn search_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<SearchRequest>,
) -> impl IntoResponse {
    let (jar, identity) = ensure_identity(jar);
    let start = Instant::now();

    let result = tokio::time::timeout(
        HANDLER_TIMEOUT,
        run_search(&state, &req.query, &identity),
    )
    .await;

    match result {
        Ok(Ok(outcome)) => {
            tracing::info!(
                query = %outcome.query,
                sources = outcome.sources.len(),
                elapsed = ?start.elapsed(),
                "Search completed"
            );
            (jar, Json(SearchResponse::from(outcome))).into_response()
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Search rejected");
            (jar, err).into_response()
        }
        Err(_) => {
            tracing::warn!(elapsed = ?start.elapsed(), "Search timed out");
            (jar, AppError::Timeout).into_response()
        }
    }
}

async fn switch_mode_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<SwitchModeRequest>,
) -> impl IntoResponse {
    let (jar, identity) = ensure_identity(jar);

    match BackendMode::parse(&req.mode) {
        Some(mode) => {
            state.sessions.set_mode(&identity, mode);
            let info = state.config.model_info(mode);
            tracing::info!(mode = mode.as_str(), "Backend mode switched");

            (
                jar,
                Json(SwitchModeResponse {
                    success: true,
                    mode: mode.as_str().to_string(),
                    backend: info.backend,
                    model: info.model,
                }),
            )
                .into_response()
        }
        None => (jar, AppError::InvalidMode(req.mode)).into_response(),
    }
}

async fn history_handler(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.history.snapshot();
    let count = history.len();
    Json(HistoryResponse { history, count })
}

async fn clear_cache_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.cache.clear();
    Json(ActionResponse {
        success: true,
        message: "Cache cleared successfully".to_string(),
    })
}

async fn clear_history_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.history.clear();
    Json(ActionResponse {
        success: true,
        message: "History cleared successfully".to_string(),
    })
}

async fn stats_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, identity) = ensure_identity(jar);
    let (_, remaining) = state.rate_limiter.check(&identity);
    let mode = state.sessions.mode(&identity);

    (
        jar,
        Json(StatsResponse {
            cache_size: state.cache.len(),
            history_size: state.history.len(),
            current_mode: mode.as_str().to_string(),
            available_modes: BackendMode::all()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            rate_limit_remaining: remaining,
            rate_limit_max: state.rate_limiter.max_requests(),
        }),
    )
}
