use serde::{Deserialize, Serialize};

use crate::config::ModelInfo;
use crate::history::HistoryEntry;
use crate::pipeline::SearchOutcome;
use crate::search::SourceResult;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Deserialize)]
pub struct SwitchModeRequest {
    pub mode: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceResult>,
    pub model_info: ModelInfo,
    pub rate_limit_remaining: usize,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        SearchResponse {
            query: outcome.query,
            answer: outcome.answer,
            sources: outcome.sources,
            model_info: outcome.model_info,
            rate_limit_remaining: outcome.rate_limit_remaining,
        }
    }
}

#[derive(Serialize)]
pub struct SwitchModeResponse {
    pub success: bool,
    pub mode: String,
    pub backend: String,
    pub model: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub cache_size: usize,
    pub history_size: usize,
    pub current_mode: String,
    pub available_modes: Vec<String>,
    pub rate_limit_remaining: usize,
    pub rate_limit_max: usize,
}
