use crate::error::StoreError;
use crate::models::{Bookmark, BookmarkKind, BookmarksConfig};
use crate::services::bookmark_store::BookmarkStore;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// A child shown inside a folder tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: BookmarkKind,
    pub placeholder: String,
}

impl From<&Bookmark> for PreviewItem {
    fn from(b: &Bookmark) -> Self {
        Self {
            id: b.id.clone(),
            title: b.display_title().to_string(),
            url: b.url.clone(),
            kind: b.kind,
            placeholder: b.placeholder(),
        }
    }
}

/// One tile of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GridEntry {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: BookmarkKind,
    pub placeholder: String,
    /// First children of a folder; empty for bookmarks
    pub preview: Vec<PreviewItem>,
}

/// A folder's header and its tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub entries: Vec<GridEntry>,
}

/// Builds grid views over a bookmark store
pub struct BookmarkBrowser {
    store: Arc<dyn BookmarkStore>,
    config: BookmarksConfig,
}

impl BookmarkBrowser {
    pub fn new(store: Arc<dyn BookmarkStore>, config: BookmarksConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn BookmarkStore> {
        &self.store
    }

    pub fn root_title(&self) -> &str {
        &self.config.root_title
    }

    /// Id of the configured root folder, looked up by title among the
    /// children of the tree's first top-level node
    pub async fn root_folder_id(&self) -> Result<String, StoreError> {
        let tree = self.store.get_tree().await?;
        tree.first()
            .and_then(|top| {
                top.children
                    .iter()
                    .find(|c| c.bookmark.is_folder() && c.bookmark.title == self.config.root_folder)
            })
            .map(|node| node.bookmark.id.clone())
            .ok_or_else(|| StoreError::NotFound(format!("folder {:?}", self.config.root_folder)))
    }

    /// The root folder, titled with the configured root title
    pub async fn root_view(&self) -> Result<FolderView, StoreError> {
        let id = self.root_folder_id().await?;
        let mut view = self.folder(&id).await?;
        view.title = self.config.root_title.clone();
        Ok(view)
    }

    pub async fn folder(&self, id: &str) -> Result<FolderView, StoreError> {
        let folder = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bookmark {id}")))?;

        let children = self.store.get_children(id).await?;
        let mut entries = Vec::with_capacity(children.len());
        for child in &children {
            entries.push(self.entry(child).await?);
        }

        tracing::debug!(folder = id, entries = entries.len(), "Built folder view");

        Ok(FolderView {
            id: folder.id,
            title: folder.title,
            parent_id: folder.parent_id,
            entries,
        })
    }

    async fn entry(&self, bookmark: &Bookmark) -> Result<GridEntry, StoreError> {
        let preview = if bookmark.is_folder() {
            self.store
                .get_children(&bookmark.id)
                .await?
                .iter()
                .take(self.config.preview_limit)
                .map(PreviewItem::from)
                .collect()
        } else {
            Vec::new()
        };

        Ok(GridEntry {
            id: bookmark.id.clone(),
            title: bookmark.display_title().to_string(),
            url: bookmark.url.clone(),
            kind: bookmark.kind,
            placeholder: bookmark.placeholder(),
            preview,
        })
    }
}

/// Where to return to when going back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub parent_id: String,
    pub header_title: String,
}

/// Folder history for drill-down browsing
#[derive(Debug, Clone)]
pub struct FolderNavigator {
    root_id: String,
    root_title: String,
    current_id: String,
    current_title: String,
    stack: Vec<NavEntry>,
}

impl FolderNavigator {
    pub fn new(root_id: impl Into<String>, root_title: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let root_title = root_title.into();
        Self {
            current_id: root_id.clone(),
            current_title: root_title.clone(),
            root_id,
            root_title,
            stack: Vec::new(),
        }
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    pub fn current_title(&self) -> &str {
        &self.current_title
    }

    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a folder, remembering the one being left
    pub fn enter(&mut self, folder_id: impl Into<String>, title: impl Into<String>) {
        let folder_id = folder_id.into();
        let title = title.into();
        let previous = NavEntry {
            parent_id: std::mem::replace(&mut self.current_id, folder_id),
            header_title: std::mem::replace(&mut self.current_title, title),
        };
        self.stack.push(previous);
    }

    /// Return to the previous folder, or to the root when there is none
    pub fn back(&mut self) {
        match self.stack.pop() {
            Some(entry) => {
                self.current_id = entry.parent_id;
                self.current_title = entry.header_title;
            }
            None => self.reset(),
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.current_id = self.root_id.clone();
        self.current_title = self.root_title.clone();
    }
}
