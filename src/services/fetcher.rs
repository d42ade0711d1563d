use crate::models::FaviconConfig;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A remote icon request that produced nothing usable
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Empty response body")]
    EmptyBody,

    #[error("Response body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("{0}")]
    Other(String),
}

/// A completed HTTP response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests for icon sources
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Fetcher backed by a shared reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FaviconConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            max_body_bytes: config.max_icon_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { limit });
        }

        // Content-Length may be absent
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::trace!(url, status, bytes = body.len(), "Fetched");

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_is_success() {
        let mut response = FetchResponse {
            status: 200,
            content_type: None,
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 204;
        assert!(response.is_success());
        response.status = 304;
        assert!(!response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }

    #[test]
    fn test_http_fetcher_builds_from_defaults() {
        assert!(HttpFetcher::new(&FaviconConfig::default()).is_ok());
    }

    fn small_fetcher(max_icon_bytes: usize) -> HttpFetcher {
        HttpFetcher::new(&FaviconConfig {
            max_icon_bytes,
            timeout_secs: 2,
            connect_timeout_secs: 1,
            ..FaviconConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let result = small_fetcher(1024)
            .fetch(&format!("{}/big.png", server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 1024 })));
    }

    #[tokio::test]
    async fn test_fetch_accepts_body_at_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/icon.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![7u8; 1024], "image/png"),
            )
            .mount(&server)
            .await;

        let response = small_fetcher(1024)
            .fetch(&format!("{}/icon.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), 1024);
        assert_eq!(response.content_type.as_deref(), Some("image/png"));
    }
}
