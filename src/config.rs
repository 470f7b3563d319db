use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::llm::BackendMode;

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub serper_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_model: String,
    pub openai_model: String,
    pub local_model: String,
    pub ollama_url: String,
    pub cache_duration: Duration,
    pub max_history: usize,
    pub rate_limit_searches: usize,
    pub rate_limit_window: Duration,
    pub max_search_results: usize,
}

/// Per-backend display metadata, surfaced by `/switch_mode` and `/stats`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ModelInfo {
    pub backend: String,
    pub model: String,
    pub mode: String,
    pub status: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse::<T>()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env_or("HOST", "127.0.0.1");
        let port: u16 = env_parse("PORT", "3000")?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            serper_api_key: env_opt("SERPER_API_KEY"),
            groq_api_key: env_opt("GROQ_API_KEY"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            groq_model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            local_model: env_or("LOCAL_MODEL", "llama2"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            cache_duration: Duration::from_secs(env_parse("CACHE_DURATION", "3600")?),
            max_history: env_parse("MAX_HISTORY", "10")?,
            rate_limit_searches: env_parse("RATE_LIMIT_SEARCHES", "50")?,
            rate_limit_window: Duration::from_secs(env_parse("RATE_LIMIT_WINDOW", "3600")?),
            max_search_results: env_parse("MAX_SEARCH_RESULTS", "5")?,
        })
    }

    /// Provider keys that are expected but absent. Logged as a warning at
    /// startup; the service still runs and degrades in-band.
    pub fn missing_api_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.serper_api_key.is_none() {
            missing.push("SERPER_API_KEY");
        }
        if self.groq_api_key.is_none() {
            missing.push("GROQ_API_KEY");
        }
        missing
    }

    pub fn model_info(&self, mode: BackendMode) -> ModelInfo {
        let (backend, model) = match mode {
            // The versatile suffix is an API artifact, not part of the name
            // users know the model by.
            BackendMode::Groq => (
                "Groq API",
                self.groq_model.replace("-versatile", ""),
            ),
            BackendMode::OpenAi => ("OpenAI", self.openai_model.clone()),
            BackendMode::Local => ("Ollama", self.local_model.clone()),
        };

        ModelInfo {
            backend: backend.to_string(),
            model,
            mode: mode.as_str().to_string(),
            status: "active".to_string(),
        }
    }
}
