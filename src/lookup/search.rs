use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::{LookupError, LookupResult, endpoint, require_key, transport_error};
use crate::http::client::HttpClient;

const PROVIDER: &str = "Tavily";
const SEARCH_PATH: &str = "/search";
const MAX_RESULTS: u8 = 5;

pub(super) async fn web_search(
    http: &HttpClient,
    base_url: &str,
    api_key: Option<&str>,
    query: &str,
) -> LookupResult<String> {
    let api_key = require_key(api_key, PROVIDER)?;

    let request = SearchRequest {
        query,
        search_depth: "advanced",
        include_answer: true,
        max_results: MAX_RESULTS,
    };
    let response = http
        .post_json(&endpoint(base_url, SEARCH_PATH), Some(api_key), &request)
        .await
        .map_err(transport_error)?;

    if response.status != 200 {
        return Err(LookupError::Provider(format!(
            "Failed to retrieve search results. Status code: {}",
            response.status
        )));
    }

    let parsed = serde_json::from_str::<SearchResponse>(&response.body).map_err(|err| {
        LookupError::Parse {
            subject: "search results",
            detail: err.to_string(),
        }
    })?;
    Ok(format_search_report(query, &parsed))
}

fn format_search_report(query: &str, response: &SearchResponse) -> String {
    let mut out = format!(
        "Search query: {}\n\n",
        response.query.as_deref().unwrap_or(query)
    );

    if let Some(answer) = response.answer.as_deref().filter(|a| !a.is_empty()) {
        let _ = write!(out, "Answer summary: {answer}\n\n");
    }

    out.push_str("Search results:\n");

    match response.results.as_deref() {
        Some(results) if !results.is_empty() => {
            for (index, hit) in results.iter().enumerate() {
                let _ = write!(
                    out,
                    "\n{}. {}\n   URL: {}\n   {}\n",
                    index + 1,
                    hit.title.as_deref().unwrap_or("No title"),
                    hit.url.as_deref().unwrap_or("No URL"),
                    hit.content.as_deref().unwrap_or("No content"),
                );
            }
        }
        _ => out.push_str("\nNo search results found."),
    }

    out
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    max_results: u8,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Option<Vec<SearchHit>>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::web_search;
    use crate::http::client::HttpClient;
    use crate::http::debug::HttpDebugConfig;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> HttpClient {
        HttpClient::new(Client::new(), HttpDebugConfig::disabled())
    }

    #[tokio::test]
    async fn sends_advanced_request_and_lists_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-key"))
            .and(body_json(json!({
                "query": "BAU admission",
                "search_depth": "advanced",
                "include_answer": true,
                "max_results": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "BAU admission",
                "answer": "Admission opens in January.",
                "results": [
                    {"title": "BAU notice", "url": "https://bau.edu.bd/n", "content": "Admission test dates"},
                    {"url": "https://example.com"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = web_search(&http(), &server.uri(), Some("tvly-key"), "BAU admission")
            .await
            .expect("search report");

        insta::assert_snapshot!(report, @r"
        Search query: BAU admission

        Answer summary: Admission opens in January.

        Search results:

        1. BAU notice
           URL: https://bau.edu.bd/n
           Admission test dates

        2. No title
           URL: https://example.com
           No content
        ");
    }

    #[tokio::test]
    async fn empty_results_produce_explicit_notice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let report = web_search(&http(), &server.uri(), Some("tvly-key"), "zzqx unknown")
            .await
            .expect("search report");

        assert_eq!(
            report,
            "Search query: zzqx unknown\n\nSearch results:\n\nNo search results found."
        );
        assert!(!report.contains("1."));
    }

    #[tokio::test]
    async fn missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = web_search(&http(), &server.uri(), None, "rain")
            .await
            .expect_err("missing key");
        assert_eq!(
            err.to_string(),
            "Error: Tavily API key not found in configuration."
        );
    }

    #[tokio::test]
    async fn error_status_reports_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = web_search(&http(), &server.uri(), Some("bad"), "rain")
            .await
            .expect_err("unauthorized");
        assert_eq!(
            err.to_string(),
            "Error: Failed to retrieve search results. Status code: 401"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = web_search(&http(), &server.uri(), Some("tvly-key"), "rain")
            .await
            .expect_err("parse error");
        assert!(err.to_string().starts_with("Error parsing search results:"));
    }
}
