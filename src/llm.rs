use serde::Serialize;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, AppError};
use crate::search::SourceResult;

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

const ANSWER_TEMPERATURE: f32 = 0.7;
const MAX_ANSWER_TOKENS: u32 = 2000;
const LOCAL_TIMEOUT: Duration = Duration::from_secs(30);

/// The LLM backend a session routes its answers through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendMode {
    #[default]
    Groq,
    OpenAi,
    Local,
}

impl BackendMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "groq" => Some(BackendMode::Groq),
            "openai" => Some(BackendMode::OpenAi),
            "local" => Some(BackendMode::Local),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendMode::Groq => "groq",
            BackendMode::OpenAi => "openai",
            BackendMode::Local => "local",
        }
    }

    pub fn all() -> [BackendMode; 3] {
        [BackendMode::Groq, BackendMode::OpenAi, BackendMode::Local]
    }
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

/// Concatenate `title: snippet` pairs for every non-diagnostic source.
pub fn build_context(sources: &[SourceResult]) -> String {
    sources
        .iter()
        .filter(|s| !s.is_diagnostic())
        .map(|s| format!("**{}**: {}", s.title, s.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(query: &str, sources: &[SourceResult]) -> String {
    let context = build_context(sources);
    format!(
        "You are a helpful AI assistant. Based on the following sources, provide a comprehensive and well-structured answer to this question: {query}\n\
         \n\
         Sources:\n\
         {context}\n\
         \n\
         Instructions:\n\
         - Provide a detailed, informative answer\n\
         - Use bullet points and clear structure\n\
         - Cite information naturally\n\
         - If sources are insufficient, acknowledge limitations\n\
         - Be accurate and objective\n\
         \n\
         Answer:"
    )
}

/// Dispatches answer synthesis to the selected backend. `generate` never
/// fails: missing credentials, transport problems, and malformed upstream
/// responses all come back as explanatory answer text.
pub struct AnswerGenerator {
    client: Client,
    config: Arc<Config>,
}

impl AnswerGenerator {
    pub fn new(config: Arc<Config>) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        AnswerGenerator { client, config }
    }

    pub async fn generate(
        &self,
        query: &str,
        sources: &[SourceResult],
        mode: BackendMode,
    ) -> String {
        let prompt = build_prompt(query, sources);

        match mode {
            BackendMode::Groq => {
                let Some(key) = self.config.groq_api_key.as_deref() else {
                    return "Error: Groq API key not configured. \
                            Please add GROQ_API_KEY to your .env file."
                        .to_string();
                };
                self.chat_completion(GROQ_URL, key, &self.config.groq_model, &prompt)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Groq error");
                        format!(
                            "Error generating answer with Groq: {}\n\n\
                             Please check your API key or try a different model.",
                            e
                        )
                    })
            }
            BackendMode::OpenAi => {
                let Some(key) = self.config.openai_api_key.as_deref() else {
                    return "Error: OpenAI API key not configured. \
                            Please add OPENAI_API_KEY to your .env file."
                        .to_string();
                };
                self.chat_completion(OPENAI_URL, key, &self.config.openai_model, &prompt)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "OpenAI error");
                        format!(
                            "Error generating answer with OpenAI: {}\n\n\
                             Please check your API key or try a different model.",
                            e
                        )
                    })
            }
            BackendMode::Local => self.generate_local(&prompt).await,
        }
    }

    async fn chat_completion(
        &self,
        url: &str,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: ANSWER_TEMPERATURE,
            max_tokens: MAX_ANSWER_TOKENS,
        };

        let res = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let json: Value = res.json().await?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AppError::TransportError("Invalid response format from LLM".to_string())
            })?
            .to_string();

        Ok(reply)
    }

    async fn generate_local(&self, prompt: &str) -> String {
        let url = format!("{}/api/generate", self.config.ollama_url);
        let result = self
            .client
            .post(&url)
            .timeout(LOCAL_TIMEOUT)
            .json(&json!({
                "model": self.config.local_model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await;

        match result {
            Ok(res) if res.status().is_success() => match res.json::<Value>().await {
                Ok(body) => body["response"]
                    .as_str()
                    .unwrap_or("No response generated")
                    .to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "Ollama error");
                    format!("Error generating answer with Ollama: {}", e)
                }
            },
            Ok(res) => format!("Error: Ollama returned status code {}", res.status().as_u16()),
            Err(e) if e.is_connect() => format!(
                "Error: Cannot connect to Ollama. Make sure Ollama is running locally ({})",
                self.config.ollama_url
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Ollama error");
                format!("Error generating answer with Ollama: {}", e)
            }
        }
    }
}
