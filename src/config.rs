use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1";

/// Runtime settings handed to the client and the query controller.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Origin of the search API, without a trailing slash.
    pub base_url: String,
    pub debounce: Duration,
    pub request_timeout: Duration,
    /// How long a successful result stays servable from the query cache.
    pub cache_ttl: Duration,
    pub skeleton_rows: usize,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debounce: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
            skeleton_rows: 10,
            user_agent: concat!("hn_story_search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AppConfig {
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}
