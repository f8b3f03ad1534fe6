//! SearchClient retry policy against a local mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hydra::error::SearchError;
use hydra::search::SearchClient;
use hydra::search::backend::{BraveSearch, DuckDuckGo};

const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

fn brave_body() -> serde_json::Value {
    serde_json::json!({
        "web": {
            "results": [
                {
                    "title": "Example",
                    "url": "https://example.com",
                    "description": "An example result"
                }
            ]
        }
    })
}

async fn brave_client(server: &MockServer) -> SearchClient {
    let backend = BraveSearch::new("test-key".to_string())
        .unwrap()
        .with_base_url(server.uri());
    SearchClient::new(Arc::new(backend), 5)
}

#[tokio::test]
async fn brave_success_returns_snippets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brave_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let result = client.query("rust", QUERY_TIMEOUT).await.unwrap();

    assert_eq!(result.snippets.len(), 1);
    assert_eq!(result.snippets[0].url, "https://example.com");
    assert_eq!(result.snippets[0].excerpt, "An example result");
}

#[tokio::test]
async fn transient_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    // Two 5xx responses, then success. Mounted first so it matches first
    // until its capacity is exhausted.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brave_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let result = client.query("rust", QUERY_TIMEOUT).await.unwrap();
    assert_eq!(result.snippets.len(), 1);
}

#[tokio::test]
async fn persistent_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    // Three attempts total: the original plus two retries.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let err = client.query("rust", QUERY_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SearchError::Status { status: 500 }));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let err = client.query("rust", QUERY_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SearchError::Status { status: 404 }));
}

#[tokio::test]
async fn rate_limit_retries_exactly_once() {
    let server = MockServer::start().await;
    // Both attempts rate limited; the retry-after hint keeps the test fast.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let err = client.query("rust", QUERY_TIMEOUT).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::RateLimited {
            retry_after: Some(d)
        } if d == Duration::ZERO
    ));
}

#[tokio::test]
async fn rate_limit_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brave_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let result = client.query("rust", QUERY_TIMEOUT).await.unwrap();
    assert_eq!(result.snippets.len(), 1);
}

#[tokio::test]
async fn malformed_payload_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let err = client.query("rust", QUERY_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, SearchError::MalformedPayload(_)));
}

#[tokio::test]
async fn empty_result_set_is_a_success_at_this_layer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"web": {"results": []}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = brave_client(&server).await;
    let result = client.query("obscure", QUERY_TIMEOUT).await.unwrap();
    assert!(result.snippets.is_empty());
}

#[tokio::test]
async fn duckduckgo_parses_lite_html_end_to_end() {
    let html = r#"
    <html><body>
    <table>
        <tr><td><a class="result-link" href="https://ddg.example">DDG Result</a></td></tr>
        <tr><td class="result-snippet">An excerpt from DDG</td></tr>
    </table>
    </body></html>
    "#;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(&server)
        .await;

    let backend = DuckDuckGo::new().unwrap().with_base_url(server.uri());
    let client = SearchClient::new(Arc::new(backend), 5);

    let result = client.query("rust", QUERY_TIMEOUT).await.unwrap();
    assert_eq!(result.snippets.len(), 1);
    assert_eq!(result.snippets[0].title, "DDG Result");
    assert_eq!(result.snippets[0].url, "https://ddg.example");
    assert_eq!(result.snippets[0].excerpt, "An excerpt from DDG");
}
