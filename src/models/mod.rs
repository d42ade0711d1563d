pub mod background;
pub mod bookmark;
pub mod config;
pub mod favicon;

pub use background::{keys, BackgroundMetadata, FitMode, Rgb};
pub use bookmark::{placeholder_glyph, Bookmark, BookmarkChanges, BookmarkKind, BookmarkNode};
pub use config::{AppConfig, BookmarksConfig, FaviconConfig, StorageConfig};
pub use favicon::{IconImage, IconSource, IconTarget};
