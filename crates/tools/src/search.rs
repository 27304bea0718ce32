//! Web search adapter.
//!
//! Default backend scrapes the DuckDuckGo HTML results page (no API key
//! needed); the Perplexity backend requires a key. An unconfigured or
//! failing backend degrades to an explicit "unavailable" result.

use std::time::Duration;

use deckhand_core::config::{SearchBackend, SearchConfig};
use serde_json::Value;

use crate::tool::{Tool, ToolParameter, ToolResult};

const USER_AGENT: &str = "deckhand/0.1";

/// One result block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchHit {
    title: String,
    url: String,
    snippet: String,
}

/// Searches the web and returns a bounded list of result blocks.
#[derive(Debug)]
pub struct WebSearchTool {
    config: SearchConfig,
}

impl WebSearchTool {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<reqwest::Client, String> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| format!("Web search unavailable: {}", e))
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchHit>, String> {
        let client = self.client()?;
        let response = client
            .get("https://html.duckduckgo.com/html/")
            .query(&[("q", query)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| format!("Web search unavailable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Web search unavailable: backend returned {}", response.status()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| format!("Web search unavailable: {}", e))?;

        Ok(parse_result_page(&html))
    }

    async fn search_perplexity(&self, query: &str) -> Result<Vec<SearchHit>, String> {
        let Some(api_key) = self.config.resolved_api_key() else {
            return Err(
                "Web search unavailable: the perplexity backend needs an API key \
                 (search.api_key or DECKHAND_SEARCH_API_KEY)"
                    .to_string(),
            );
        };

        let client = self.client()?;
        let body = serde_json::json!({
            "model": "sonar",
            "messages": [
                { "role": "system", "content": "Return concise search results with source URLs." },
                { "role": "user", "content": query }
            ],
            "max_tokens": 1024
        });

        let response = client
            .post("https://api.perplexity.ai/chat/completions")
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Web search unavailable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Web search unavailable: backend returned {}", response.status()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Web search unavailable: malformed backend response: {}", e))?;

        Ok(perplexity_hits(query, &json))
    }
}

/// Turn a Perplexity response into result blocks: the answer text plus one
/// block per citation URL.
fn perplexity_hits(query: &str, json: &Value) -> Vec<SearchHit> {
    let answer = json
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let citations: Vec<&str> = json
        .pointer("/citations")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    if citations.is_empty() {
        if answer.is_empty() {
            return Vec::new();
        }
        return vec![SearchHit {
            title: format!("Answer for: {}", query),
            url: String::new(),
            snippet: answer.to_string(),
        }];
    }

    citations
        .iter()
        .enumerate()
        .map(|(i, url)| SearchHit {
            title: format!("Result {}", i + 1),
            url: (*url).to_string(),
            snippet: if i == 0 { answer.to_string() } else { String::new() },
        })
        .collect()
}

/// Parse the DuckDuckGo HTML results page.
///
/// Result links carry `class="result__a"`, snippets `class="result__snippet"`.
fn parse_result_page(html: &str) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut title = String::new();
    let mut url = String::new();

    for line in html.lines() {
        let line = line.trim();

        if line.contains("class=\"result__a\"") {
            if let Some(href) = attr_value(line, "href") {
                url = resolve_redirect(&href);
            }
            title = tag_text(line);
        }

        if line.contains("class=\"result__snippet\"") && !url.is_empty() {
            hits.push(SearchHit {
                title: std::mem::take(&mut title),
                url: std::mem::take(&mut url),
                snippet: tag_text(line),
            });
        }
    }

    hits
}

/// Extract an attribute value from a tag string.
fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=\"", attr);
    let start = tag.find(&pattern)? + pattern.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Extract text content from a tag string, stripping inner markup.
fn tag_text(tag: &str) -> String {
    let content_start = tag.find('>').map(|i| i + 1).unwrap_or(0);
    let mut text = String::new();
    let mut in_tag = false;

    for ch in tag[content_start..].chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.trim().to_string()
}

/// Unwrap DuckDuckGo redirect URLs (`//duckduckgo.com/l/?uddg=ENCODED`).
fn resolve_redirect(href: &str) -> String {
    if let Some(start) = href.find("uddg=") {
        let rest = &href[start + 5..];
        let end = rest.find('&').unwrap_or(rest.len());
        if let Some(decoded) = percent_decode(&rest[..end]) {
            return decoded;
        }
    }

    match href.strip_prefix("//") {
        Some(stripped) => format!("https://{}", stripped),
        None => href.to_string(),
    }
}

/// Percent-decoding sufficient for redirect values.
fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8(out).ok()
}

/// Render hits as newline-delimited result blocks, capped at `max`.
fn format_results(query: &str, hits: &[SearchHit], max: usize) -> String {
    if hits.is_empty() {
        return format!("No results found for '{}'.", query);
    }

    hits.iter()
        .take(max)
        .enumerate()
        .map(|(i, hit)| {
            let mut block = format!("{}. {}", i + 1, hit.title);
            if !hit.snippet.is_empty() {
                block.push_str(&format!("\n   {}", hit.snippet));
            }
            if !hit.url.is_empty() {
                block.push_str(&format!("\n   source: {}", hit.url));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web and return a short list of results (title, snippet, source)."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![(
            "query".to_string(),
            ToolParameter::new_string("The search query"),
        )])
        .with_required(vec!["query"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(query) = arguments.get("query").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'query' parameter");
        };

        let outcome = match self.config.backend {
            SearchBackend::DuckDuckGo => self.search_duckduckgo(query).await,
            SearchBackend::Perplexity => self.search_perplexity(query).await,
        };

        match outcome {
            Ok(hits) => ToolResult::success(format_results(query, &hits, self.config.max_results)),
            Err(message) => ToolResult::error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r##"
<div class="result">
<a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Frust&rut=x">Rust <b>Language</b></a>
<a class="result__snippet" href="#">A systems programming language.</a>
</div>
<div class="result">
<a class="result__a" href="https://example.org/slides">Slide tips</a>
<a class="result__snippet" href="#">Making better decks.</a>
</div>
"##;

    #[test]
    fn test_parse_result_page() {
        let hits = parse_result_page(RESULTS_PAGE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust Language");
        assert_eq!(hits[0].url, "https://example.com/rust");
        assert_eq!(hits[0].snippet, "A systems programming language.");
        assert_eq!(hits[1].url, "https://example.org/slides");
    }

    #[test]
    fn test_attr_value() {
        let tag = r#"<a class="result__a" href="https://example.com">t</a>"#;
        assert_eq!(attr_value(tag, "href").as_deref(), Some("https://example.com"));
        assert_eq!(attr_value(tag, "class").as_deref(), Some("result__a"));
        assert!(attr_value(tag, "id").is_none());
    }

    #[test]
    fn test_tag_text_strips_markup() {
        let tag = r##"<a href="#">Hello <b>World</b></a>"##;
        assert_eq!(tag_text(tag), "Hello World");
    }

    #[test]
    fn test_resolve_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(resolve_redirect(href), "https://example.com/page");

        assert_eq!(resolve_redirect("https://direct.example.com"), "https://direct.example.com");
        assert_eq!(resolve_redirect("//bare.example.com"), "https://bare.example.com");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hello%20world").as_deref(), Some("hello world"));
        assert_eq!(percent_decode("a+b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%zz"), None);
    }

    #[test]
    fn test_format_results_caps_and_numbers() {
        let hits: Vec<SearchHit> = (1..=8)
            .map(|i| SearchHit {
                title: format!("Title {}", i),
                url: format!("https://example.com/{}", i),
                snippet: format!("Snippet {}", i),
            })
            .collect();

        let text = format_results("q", &hits, 5);
        assert!(text.contains("1. Title 1"));
        assert!(text.contains("5. Title 5"));
        assert!(!text.contains("Title 6"));
        assert!(text.contains("source: https://example.com/1"));
    }

    #[test]
    fn test_format_results_empty() {
        let text = format_results("quartz decks", &[], 5);
        assert_eq!(text, "No results found for 'quartz decks'.");
    }

    #[test]
    fn test_perplexity_hits_with_citations() {
        let json = serde_json::json!({
            "choices": [{"message": {"content": "The answer."}}],
            "citations": ["https://a.example", "https://b.example"]
        });

        let hits = perplexity_hits("q", &json);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "The answer.");
        assert_eq!(hits[1].url, "https://b.example");
        assert!(hits[1].snippet.is_empty());
    }

    #[test]
    fn test_perplexity_hits_answer_only() {
        let json = serde_json::json!({"choices": [{"message": {"content": "Just an answer."}}]});
        let hits = perplexity_hits("my query", &json);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].title.contains("my query"));
    }

    #[tokio::test]
    async fn test_missing_query_parameter() {
        let tool = WebSearchTool::new(SearchConfig::default());
        let result = tool.execute(&serde_json::json!({})).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("query"));
    }

    #[tokio::test]
    async fn test_perplexity_without_key_is_unavailable() {
        // Guard: only meaningful when the env override is not set.
        if std::env::var("DECKHAND_SEARCH_API_KEY").is_ok() {
            return;
        }

        let config = SearchConfig { backend: SearchBackend::Perplexity, api_key: None, ..Default::default() };
        let tool = WebSearchTool::new(config);

        let result = tool.execute(&serde_json::json!({"query": "anything"})).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("unavailable"));
    }
}
