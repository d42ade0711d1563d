use crate::models::{Bookmark, IconImage, IconSource, IconTarget};
use crate::services::fetcher::{FetchError, FetchResponse, Fetcher};
use crate::services::kv_store::{Entries, KeyValueStore};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Try `attempt` on each item in order and return the first success.
///
/// Attempts are strictly sequential; later items are never started once one
/// succeeds.
pub async fn first_success<I, T, E, F, Fut>(items: I, mut attempt: F) -> Option<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for item in items {
        if let Ok(value) = attempt(item).await {
            return Some(value);
        }
    }
    None
}

/// Resolves page URLs to displayable icons, caching per origin
pub struct FaviconResolver {
    cache: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<IconSource>,
}

impl FaviconResolver {
    pub fn new(
        cache: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<IconSource>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            sources,
        }
    }

    pub fn sources(&self) -> &[IconSource] {
        &self.sources
    }

    /// Icon for a bookmark; folders and URL-less bookmarks have none
    pub async fn resolve_bookmark(&self, bookmark: &Bookmark) -> Option<IconImage> {
        if bookmark.is_folder() {
            return None;
        }
        self.resolve(bookmark.url.as_deref()).await
    }

    /// Resolve an icon for `page_url`.
    ///
    /// Returns `None` without touching the cache or the network when the URL
    /// is absent, empty, or has no network origin. Otherwise the cached entry
    /// for the origin wins; on a miss every source is tried in order and the
    /// first non-empty body is cached and returned.
    pub async fn resolve(&self, page_url: Option<&str>) -> Option<IconImage> {
        let page_url = page_url.map(str::trim).filter(|u| !u.is_empty())?;
        let Some(target) = IconTarget::from_page_url(page_url) else {
            tracing::debug!(url = page_url, "No icon origin for URL");
            return None;
        };

        if let Some(icon) = self.cached(&target.origin).await {
            tracing::trace!(origin = %target.origin, "Favicon cache hit");
            return Some(icon);
        }

        let target = &target;
        let icon = first_success(&self.sources, move |source| self.try_source(source, target)).await;

        match icon {
            Some(icon) => {
                self.store(&target.origin, &icon).await;
                Some(icon)
            }
            None => {
                tracing::info!(origin = %target.origin, "No favicon source succeeded");
                None
            }
        }
    }

    async fn cached(&self, origin: &str) -> Option<IconImage> {
        match self.cache.get_value(origin).await {
            Ok(Some(Value::String(value))) => IconImage::from_data_url(value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(origin, error = %e, "Favicon cache read failed");
                None
            }
        }
    }

    async fn store(&self, origin: &str, icon: &IconImage) {
        let mut entries = Entries::new();
        entries.insert(origin.to_string(), Value::String(icon.as_str().to_string()));
        if let Err(e) = self.cache.set(entries).await {
            tracing::warn!(origin, error = %e, "Failed to cache favicon");
        } else {
            tracing::debug!(origin, mime = icon.mime_type(), "Cached favicon");
        }
    }

    async fn try_source(
        &self,
        source: &IconSource,
        target: &IconTarget,
    ) -> Result<IconImage, FetchError> {
        let url = source.request_url(target);
        let result = self.fetcher.fetch(&url).await.and_then(accept);

        match &result {
            Ok(icon) => tracing::debug!(
                source = source.name(),
                url = %url,
                mime = icon.mime_type(),
                "Favicon source succeeded"
            ),
            Err(e) => tracing::warn!(
                source = source.name(),
                url = %url,
                error = %e,
                "Favicon source failed"
            ),
        }
        result
    }
}

/// Turn a response into an icon, or the reason it is a miss
fn accept(response: FetchResponse) -> Result<IconImage, FetchError> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    if response.body.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    let mime = icon_mime(response.content_type.as_deref(), &response.body);
    Ok(IconImage::encode(&mime, &response.body))
}

/// Declared content type without parameters, else sniffed, else a generic binary type
pub fn icon_mime(content_type: Option<&str>, body: &[u8]) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    if let Some(mime) = declared {
        return mime;
    }

    image::guess_format(body)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME.to_string())
}
