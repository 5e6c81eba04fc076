//! NewsAPI.org v2 client

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::models::NewsResponse;
use crate::config::NewsSettings;

/// Errors from the news API
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("no news API key configured (set news.api_key or NEWS_API_KEY)")]
    MissingApiKey,
    #[error("news API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("news API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the headline and search endpoints
pub struct NewsApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    sources: String,
}

impl NewsApi {
    pub fn new(settings: &NewsSettings) -> Result<Self, NewsError> {
        let client = reqwest::Client::builder()
            // NewsAPI rejects requests without a user agent
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.resolved_api_key(),
            sources: settings.sources.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn api_key(&self) -> Result<&str, NewsError> {
        self.api_key.as_deref().ok_or(NewsError::MissingApiKey)
    }

    fn headlines_query(&self, page: u32) -> Result<Vec<(&'static str, String)>, NewsError> {
        Ok(vec![
            ("sources", self.sources.clone()),
            ("page", page.to_string()),
            ("apiKey", self.api_key()?.to_string()),
        ])
    }

    fn search_query(&self, query: &str, page: u32) -> Result<Vec<(&'static str, String)>, NewsError> {
        Ok(vec![
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("sources", self.sources.clone()),
            ("apiKey", self.api_key()?.to_string()),
        ])
    }

    /// Top headlines from the configured sources
    pub async fn get_headlines(&self, page: u32) -> Result<NewsResponse, NewsError> {
        let query = self.headlines_query(page)?;
        self.fetch("v2/top-headlines", &query).await
    }

    /// Full-text search within the configured sources
    pub async fn search_news(&self, query: &str, page: u32) -> Result<NewsResponse, NewsError> {
        let query = self.search_query(query, page)?;
        self.fetch("v2/everything", &query).await
    }

    async fn fetch(&self, path: &str, query: &[(&'static str, String)]) -> Result<NewsResponse, NewsError> {
        let url = self.endpoint(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let news: NewsResponse = response.json().await?;
        info!("Fetched {} articles from {}", news.articles.len(), path);
        Ok(news)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings(base_url: &str, api_key: Option<&str>) -> NewsSettings {
        NewsSettings {
            base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            sources: "cnn".to_string(),
            timeout_secs: 5,
        }
    }

    /// Serve one canned HTTP response and hand back the request line
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{}/", addr), handle)
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let api = NewsApi::new(&settings("https://newsapi.org/", Some("k"))).unwrap();
        assert_eq!(api.endpoint("v2/top-headlines"), "https://newsapi.org/v2/top-headlines");
        assert_eq!(api.endpoint("/v2/everything"), "https://newsapi.org/v2/everything");
    }

    #[test]
    fn test_queries_carry_sources_and_key() {
        let api = NewsApi::new(&settings("https://newsapi.org", Some("k"))).unwrap();

        let headlines = api.headlines_query(2).unwrap();
        assert!(headlines.contains(&("sources", "cnn".to_string())));
        assert!(headlines.contains(&("page", "2".to_string())));
        assert!(headlines.contains(&("apiKey", "k".to_string())));

        let search = api.search_query("rust lang", 1).unwrap();
        assert_eq!(search[0], ("q", "rust lang".to_string()));
        assert!(search.contains(&("sources", "cnn".to_string())));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let mut s = settings("http://127.0.0.1:9", None);
        s.api_key = Some("   ".to_string());
        let mut api = NewsApi::new(&s).unwrap();
        // Ignore whatever NEWS_API_KEY the environment carries
        api.api_key = None;

        let result = api.get_headlines(1).await;
        assert!(matches!(result, Err(NewsError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_get_headlines_decodes_response() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"status":"ok","totalResults":1,"articles":[{"source":{"id":"cnn","name":"CNN"},"title":"Hello","url":"https://cnn.com/hello"}]}"#,
        )
        .await;

        let api = NewsApi::new(&settings(&base, Some("key123"))).unwrap();
        let response = api.get_headlines(3).await.unwrap();

        assert_eq!(response.total_results, 1);
        assert_eq!(response.articles[0].title.as_deref(), Some("Hello"));

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /v2/top-headlines?"));
        assert!(request_line.contains("sources=cnn"));
        assert!(request_line.contains("page=3"));
        assert!(request_line.contains("apiKey=key123"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base, server) = serve_once(
            "401 Unauthorized",
            r#"{"status":"error","code":"apiKeyInvalid"}"#,
        )
        .await;

        let api = NewsApi::new(&settings(&base, Some("bad"))).unwrap();
        let result = api.search_news("rust", 1).await;

        match result {
            Err(NewsError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("apiKeyInvalid"));
            }
            other => panic!("expected status error, got {:?}", other),
        }

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /v2/everything?q=rust"));
    }
}
