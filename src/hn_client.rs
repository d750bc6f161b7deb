use reqwest::Client;
use std::future::Future;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{SearchResponse, Story};

/// Anything that can turn a committed search term into a story listing.
pub trait StoryFetcher: Send + Sync + 'static {
    fn fetch_stories(&self, term: &str) -> impl Future<Output = Result<Vec<Story>, FetchError>> + Send;
}

pub struct HackerNewsClient {
    client: Client,
    base_url: String,
}

impl HackerNewsClient {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Front page for an empty term, full-text search otherwise.
    pub fn endpoint_for(&self, term: &str) -> String {
        if term.is_empty() {
            format!("{}/search?tags=front_page", self.base_url)
        } else {
            format!("{}/search?query={}", self.base_url, urlencoding::encode(term))
        }
    }

    async fn fetch_fresh_stories(&self, term: &str) -> Result<Vec<Story>, FetchError> {
        let url = self.endpoint_for(term);
        debug!(%url, "requesting stories");

        // Timeouts and connection errors surface here as Network
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let stories = parse_stories(&body)?;
        debug!(count = stories.len(), "parsed stories");
        Ok(stories)
    }
}

impl StoryFetcher for HackerNewsClient {
    async fn fetch_stories(&self, term: &str) -> Result<Vec<Story>, FetchError> {
        self.fetch_fresh_stories(term).await
    }
}

pub fn parse_stories(body: &str) -> Result<Vec<Story>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.hits)
}


#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;

    fn client_for(base_url: &str) -> HackerNewsClient {
        HackerNewsClient::new(&AppConfig::default().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn empty_term_requests_front_page() {
        let client = client_for("https://hn.algolia.com/api/v1");
        assert_eq!(
            client.endpoint_for(""),
            "https://hn.algolia.com/api/v1/search?tags=front_page"
        );
    }

    #[test]
    fn search_term_is_percent_encoded() {
        let client = client_for("https://hn.algolia.com/api/v1");
        assert_eq!(
            client.endpoint_for("rust & c++/wasm"),
            "https://hn.algolia.com/api/v1/search?query=rust%20%26%20c%2B%2B%2Fwasm"
        );
    }

    #[tokio::test]
    async fn fetches_and_parses_hits() {
        let (base_url, server) = serve_once(
            200,
            r#"{"hits":[{"objectID":"1","title":"Foo","points":42,"url":"http://x","num_comments":3}],"nbHits":1}"#,
        );
        let client = client_for(&base_url);

        let stories = client.fetch_stories("foo bar").await.unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "Foo");
        assert_eq!(stories[0].score, 42);

        let request_line = server.join().unwrap();
        assert_eq!(request_line, "GET /search?query=foo%20bar HTTP/1.1");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base_url, server) = serve_once(503, "{}");
        let client = client_for(&base_url);

        let err = client.fetch_stories("").await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(503)));
        assert_eq!(server.join().unwrap(), "GET /search?tags=front_page HTTP/1.1");
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let (base_url, server) = serve_once(200, "<html>not json</html>");
        let client = client_for(&base_url);

        let err = client.fetch_stories("x").await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let client = client_for("http://127.0.0.1:1");
        let err = client.fetch_stories("x").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
