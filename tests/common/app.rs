//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use newtab::models::{AppConfig, BookmarkNode, IconSource};
use newtab::server::{build_router, AppState};
use newtab::services::{HttpFetcher, InMemoryBlobStore, InMemoryBookmarkStore, InMemoryKvStore};

use super::fixtures;

/// Test application with router and direct access to the stores
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    pub kv: Arc<InMemoryKvStore>,
    pub blobs: Arc<InMemoryBlobStore>,
}

impl TestApp {
    /// In-memory stores, the sample bookmark tree and the default icon sources
    pub fn new() -> Self {
        Self::build(AppConfig::default(), fixtures::sample_tree())
    }

    /// Icon sources replaced by `sources` (e.g. a mock server)
    pub fn with_sources(sources: Vec<IconSource>) -> Self {
        let mut config = AppConfig::default();
        config.favicon.sources = sources;
        config.favicon.timeout_secs = 2;
        config.favicon.connect_timeout_secs = 1;
        Self::build(config, fixtures::sample_tree())
    }

    pub fn with_bookmarks(tree: Vec<BookmarkNode>) -> Self {
        Self::build(AppConfig::default(), tree)
    }

    fn build(config: AppConfig, tree: Vec<BookmarkNode>) -> Self {
        let kv = Arc::new(InMemoryKvStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let bookmarks =
            Arc::new(InMemoryBookmarkStore::from_tree(tree).expect("Invalid bookmark tree"));
        let fetcher =
            Arc::new(HttpFetcher::new(&config.favicon).expect("Failed to build HTTP client"));

        let state = AppState::with_stores(config, kv.clone(), blobs.clone(), bookmarks, fetcher);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            kv,
            blobs,
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a DELETE request to the given path
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a PUT request with a raw binary body
    pub async fn put_bytes(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::put(path)
            .header("Content-Type", "application/octet-stream")
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// Make a PUT request with a JSON body
    pub async fn put_json(&self, path: &str, body: serde_json::Value) -> TestResponse {
        let request = Request::put(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch_json(&self, path: &str, body: serde_json::Value) -> TestResponse {
        let request = Request::patch(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Upload a background and return the response JSON
    pub async fn set_background(&self, image: Vec<u8>) -> serde_json::Value {
        let response = self.put_bytes("/api/background", image).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
