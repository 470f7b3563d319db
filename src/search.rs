use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use once_cell::sync::Lazy;
use crate::error::Result;

/// Reserved `source` tag marking a synthetic diagnostic entry. Diagnostic
/// entries are shown to the user but never fed to an answer backend.
pub const ERROR_SOURCE: &str = "Error";

const SERPER_URL: &str = "https://google.serper.dev/search";
const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

// Create static selectors to avoid recompiling them each time
static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.result").expect("Failed to parse result selector")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.result__a").expect("Failed to parse title selector")
});
static SNIPPET_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".result__snippet").expect("Failed to parse snippet selector")
});

/// A provenance-tagged search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: String,
}

impl SourceResult {
    pub fn diagnostic(title: &str, snippet: String) -> Self {
        SourceResult {
            title: title.to_string(),
            snippet,
            url: "#".to_string(),
            source: ERROR_SOURCE.to_string(),
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        self.source == ERROR_SOURCE
    }
}

/// Web search with a keyed primary provider (Serper) and a keyless
/// fallback (DuckDuckGo HTML). `search` never fails: primary transport
/// problems degrade to the fallback, and a fallback failure yields an
/// empty list ("no sources found").
pub struct WebSearch {
    serper_api_key: Option<String>,
    serper_url: String,
    duckduckgo_url: String,
}

impl WebSearch {
    pub fn new(serper_api_key: Option<String>) -> Self {
        WebSearch {
            serper_api_key,
            serper_url: SERPER_URL.to_string(),
            duckduckgo_url: DUCKDUCKGO_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoints(
        serper_api_key: Option<String>,
        serper_url: &str,
        duckduckgo_url: &str,
    ) -> Self {
        WebSearch {
            serper_api_key,
            serper_url: serper_url.to_string(),
            duckduckgo_url: duckduckgo_url.to_string(),
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SourceResult> {
        if let Some(key) = &self.serper_api_key {
            match self.search_serper(key, query, max_results).await {
                Ok(results) if !results.is_empty() => {
                    tracing::debug!(query, count = results.len(), "Serper API used");
                    return results;
                }
                Ok(_) => {
                    tracing::warn!(query, "Serper returned no results, using DuckDuckGo fallback");
                }
                Err(e) => {
                    tracing::warn!(query, error = %e, "Serper failed, using DuckDuckGo fallback");
                }
            }
        }

        match self.search_duckduckgo(query, max_results).await {
            Ok(results) => {
                tracing::debug!(query, count = results.len(), "DuckDuckGo used");
                results
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "DuckDuckGo search failed");
                Vec::new()
            }
        }
    }

    async fn search_serper(
        &self,
        api_key: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceResult>> {
        let response = CLIENT
            .post(&self.serper_url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": max_results }))
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        Ok(shape_serper_results(&data, max_results))
    }

    async fn search_duckduckgo(&self, query: &str, max_results: usize) -> Result<Vec<SourceResult>> {
        let response = CLIENT
            .get(&self.duckduckgo_url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?;

        let html = response.text().await?;
        Ok(parse_duckduckgo_html(&html, max_results))
    }
}

/// Shape a raw Serper response: up to `max_results` organic hits, with the
/// knowledge-graph block prepended when present and there is still room.
fn shape_serper_results(data: &Value, max_results: usize) -> Vec<SourceResult> {
    let mut results = Vec::new();

    if let Some(organic) = data["organic"].as_array() {
        for item in organic.iter().take(max_results) {
            results.push(SourceResult {
                title: item["title"].as_str().unwrap_or("No title").to_string(),
                snippet: item["snippet"]
                    .as_str()
                    .unwrap_or("No description available")
                    .to_string(),
                url: item["link"].as_str().unwrap_or("#").to_string(),
                source: "Serper".to_string(),
            });
        }
    }

    let kg = &data["knowledgeGraph"];
    if let Some(description) = kg["description"].as_str() {
        if results.len() < max_results {
            results.insert(
                0,
                SourceResult {
                    title: kg["title"].as_str().unwrap_or("No title").to_string(),
                    snippet: description.to_string(),
                    url: kg["website"].as_str().unwrap_or("#").to_string(),
                    source: "Knowledge Graph".to_string(),
                },
            );
        }
    }

    results
}

fn parse_duckduckgo_html(html: &str, max_results: usize) -> Vec<SourceResult> {
    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for result in document.select(&RESULT_SELECTOR) {
        if results.len() >= max_results {
            break;
        }

        let Some(link) = result.select(&TITLE_SELECTOR).next() else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let url = link.value().attr("href").unwrap_or("#").to_string();
        let snippet = result
            .select(&SNIPPET_SELECTOR)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SourceResult {
            title,
            snippet,
            url,
            source: "DuckDuckGo".to_string(),
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_organic_results_with_cap() {
        let data = json!({
            "organic": [
                {"title": "A", "snippet": "a", "link": "https://a.example"},
                {"title": "B", "snippet": "b", "link": "https://b.example"},
                {"title": "C", "snippet": "c", "link": "https://c.example"},
            ]
        });

        let results = shape_serper_results(&data, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "A");
        assert_eq!(results[1].url, "https://b.example");
        assert!(results.iter().all(|r| r.source == "Serper"));
    }

    #[test]
    fn prepends_knowledge_graph_when_room_remains() {
        let data = json!({
            "organic": [{"title": "A", "snippet": "a", "link": "https://a.example"}],
            "knowledgeGraph": {
                "title": "Paris",
                "description": "Capital of France",
                "website": "https://paris.fr"
            }
        });

        let results = shape_serper_results(&data, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "Knowledge Graph");
        assert_eq!(results[0].snippet, "Capital of France");
        assert_eq!(results[1].source, "Serper");
    }

    #[test]
    fn skips_knowledge_graph_when_at_cap() {
        let data = json!({
            "organic": [
                {"title": "A", "snippet": "a", "link": "https://a.example"},
                {"title": "B", "snippet": "b", "link": "https://b.example"},
            ],
            "knowledgeGraph": {"title": "X", "description": "desc"}
        });

        let results = shape_serper_results(&data, 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.source == "Serper"));
    }

    #[test]
    fn fills_missing_fields_with_placeholders() {
        let data = json!({"organic": [{}]});
        let results = shape_serper_results(&data, 5);
        assert_eq!(results[0].title, "No title");
        assert_eq!(results[0].snippet, "No description available");
        assert_eq!(results[0].url, "#");
    }

    #[test]
    fn parses_duckduckgo_result_blocks() {
        let html = r#"
            <html><body>
            <div class="result">
                <a class="result__a" href="https://one.example">First hit</a>
                <a class="result__snippet">First snippet text</a>
            </div>
            <div class="result">
                <a class="result__a" href="https://two.example">Second hit</a>
                <a class="result__snippet">Second snippet text</a>
            </div>
            </body></html>
        "#;

        let results = parse_duckduckgo_html(html, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First hit");
        assert_eq!(results[0].url, "https://one.example");
        assert_eq!(results[0].snippet, "First snippet text");
        assert_eq!(results[0].source, "DuckDuckGo");
    }

    #[test]
    fn duckduckgo_parse_respects_cap_and_empty_page() {
        let html = r#"
            <div class="result"><a class="result__a" href="u1">A</a></div>
            <div class="result"><a class="result__a" href="u2">B</a></div>
        "#;
        assert_eq!(parse_duckduckgo_html(html, 1).len(), 1);
        assert!(parse_duckduckgo_html("<html></html>", 5).is_empty());
    }

    #[tokio::test]
    async fn fallback_transport_failure_yields_empty_sources() {
        // Unbound loopback ports: both providers fail with a connect error.
        let keyless = WebSearch::with_endpoints(None, "http://127.0.0.1:9", "http://127.0.0.1:9");
        assert!(keyless.search("anything", 5).await.is_empty());

        let keyed = WebSearch::with_endpoints(
            Some("key".to_string()),
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
        );
        assert!(keyed.search("anything", 5).await.is_empty());
    }

    #[test]
    fn diagnostic_entries_are_tagged() {
        let d = SourceResult::diagnostic("Search Error", "boom".to_string());
        assert!(d.is_diagnostic());
        assert_eq!(d.source, ERROR_SOURCE);
        assert_eq!(d.url, "#");
    }
}
