pub mod background_manager;
pub mod blob_store;
pub mod bookmark_browser;
pub mod bookmark_store;
pub mod favicon_resolver;
pub mod fetcher;
pub mod kv_store;

pub use background_manager::{BackgroundError, BackgroundManager};
pub use blob_store::{BlobStore, FileBlobStore, InMemoryBlobStore};
pub use bookmark_browser::{BookmarkBrowser, FolderNavigator, FolderView, GridEntry, PreviewItem};
pub use bookmark_store::{BookmarkStore, InMemoryBookmarkStore};
pub use favicon_resolver::FaviconResolver;
pub use fetcher::{FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use kv_store::{InMemoryKvStore, JsonFileKvStore, KeyValueStore};
