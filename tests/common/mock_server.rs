//! Mock icon sources for favicon tests.
//!
//! The mock server plays all three roles: it is the site itself (serving
//! `/apple-touch-icon.png`), the icon proxy under `/icon/{hostname}` and the
//! favicon service under `/s2/favicons`.

use newtab::models::IconSource;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const PROXY_PREFIX: &str = "/icon";
pub const SERVICE_PATH: &str = "/s2/favicons";

/// Wrapper around wiremock MockServer with icon-source helpers
pub struct MockIconServer {
    pub server: MockServer,
}

impl MockIconServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server (its origin)
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// A page URL on the mock site
    pub fn page_url(&self, page: &str) -> String {
        format!("{}{}", self.server.uri(), page)
    }

    /// Hostname the proxy and service are queried with
    pub fn hostname(&self) -> String {
        self.server.address().ip().to_string()
    }

    /// The three default source kinds, all pointing at this server
    pub fn sources(&self) -> Vec<IconSource> {
        vec![
            IconSource::AppleTouchIcon,
            IconSource::IconProxy {
                base: format!("{}{}", self.url(), PROXY_PREFIX),
            },
            IconSource::FaviconService {
                base: format!("{}{}", self.url(), SERVICE_PATH),
                size: 128,
            },
        ]
    }

    /// `/apple-touch-icon.png` on the site
    pub async fn mock_apple_touch_icon(&self, response: ResponseTemplate, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/apple-touch-icon.png"))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// `/icon/{hostname}` on the proxy
    pub async fn mock_icon_proxy(&self, response: ResponseTemplate, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", PROXY_PREFIX, self.hostname())))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// `/s2/favicons?domain={hostname}&sz=128` on the service
    pub async fn mock_favicon_service(&self, response: ResponseTemplate, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(SERVICE_PATH))
            .and(query_param("domain", self.hostname()))
            .and(query_param("sz", "128"))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Requests received so far, in order, as `path?query`
    pub async fn received_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| match r.url.query() {
                Some(q) => format!("{}?{}", r.url.path(), q),
                None => r.url.path().to_string(),
            })
            .collect()
    }
}

/// 200 with an image body and content type
pub fn icon_response(body: &[u8], content_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.to_vec())
        .insert_header("content-type", content_type)
}

