use crate::error::StoreError;
use crate::models::{Bookmark, BookmarkChanges, BookmarkNode};
use crate::services::kv_store::write_atomically;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use url::Url;

/// Ids of the built-in tree, shaped like a browser profile
pub const ROOT_ID: &str = "root________";
pub const MENU_ID: &str = "menu________";
pub const TOOLBAR_ID: &str = "toolbar_____";
pub const UNFILED_ID: &str = "unfiled_____";
pub const MOBILE_ID: &str = "mobile______";

/// Bookmark tree access
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Direct children of a folder, in order
    async fn get_children(&self, folder_id: &str) -> Result<Vec<Bookmark>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Bookmark>, StoreError>;

    /// Change the title and/or URL of a node
    async fn update(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, StoreError>;

    /// The whole tree, starting at the top-level nodes
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError>;
}

#[derive(Debug, Clone, Default)]
struct Tree {
    roots: Vec<String>,
    nodes: HashMap<String, Bookmark>,
    children: HashMap<String, Vec<String>>,
}

impl Tree {
    fn from_nodes(top: Vec<BookmarkNode>) -> Result<Self, StoreError> {
        let mut tree = Tree::default();
        let mut seen = HashSet::new();
        for node in top {
            let id = tree.insert(node, None, &mut seen)?;
            tree.roots.push(id);
        }
        Ok(tree)
    }

    fn insert(
        &mut self,
        node: BookmarkNode,
        parent_id: Option<&str>,
        seen: &mut HashSet<String>,
    ) -> Result<String, StoreError> {
        let BookmarkNode {
            mut bookmark,
            children,
        } = node;

        if bookmark.id.is_empty() {
            return Err(StoreError::Invalid("bookmark without id".to_string()));
        }
        if !seen.insert(bookmark.id.clone()) {
            return Err(StoreError::Invalid(format!(
                "duplicate bookmark id: {}",
                bookmark.id
            )));
        }
        if !bookmark.is_folder() && !children.is_empty() {
            return Err(StoreError::Invalid(format!(
                "bookmark {} has children but is not a folder",
                bookmark.id
            )));
        }

        bookmark.parent_id = parent_id.map(str::to_string);
        let id = bookmark.id.clone();

        if bookmark.is_folder() {
            let mut child_ids = Vec::with_capacity(children.len());
            for child in children {
                child_ids.push(self.insert(child, Some(&id), seen)?);
            }
            self.children.insert(id.clone(), child_ids);
        }

        self.nodes.insert(id.clone(), bookmark);
        Ok(id)
    }

    fn node(&self, id: &str) -> Option<BookmarkNode> {
        let bookmark = self.nodes.get(id)?.clone();
        let children = self
            .children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| self.node(c)).collect())
            .unwrap_or_default();
        Some(BookmarkNode::new(bookmark).with_children(children))
    }

    fn to_nodes(&self) -> Vec<BookmarkNode> {
        self.roots.iter().filter_map(|id| self.node(id)).collect()
    }
}

/// Bookmark tree held in memory, optionally mirrored to a JSON file
pub struct InMemoryBookmarkStore {
    tree: RwLock<Tree>,
    file: Option<PathBuf>,
}

impl InMemoryBookmarkStore {
    /// Store over the given top-level nodes. `parentId` is derived from the
    /// structure; values in the input are ignored.
    pub fn from_tree(nodes: Vec<BookmarkNode>) -> Result<Self, StoreError> {
        Ok(Self {
            tree: RwLock::new(Tree::from_nodes(nodes)?),
            file: None,
        })
    }

    /// Store over the built-in empty profile
    pub fn with_default_tree() -> Self {
        let tree = Tree::from_nodes(default_tree()).unwrap_or_default();
        Self {
            tree: RwLock::new(tree),
            file: None,
        }
    }

    /// Load a JSON tree (an array of top-level nodes) and write edits back
    /// to it. A missing file starts from the built-in profile.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let nodes = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Bookmark file not found, starting empty");
                default_tree()
            }
            Err(e) => return Err(e.into()),
        };

        let tree = Tree::from_nodes(nodes)?;
        tracing::info!(
            path = %path.display(),
            bookmarks = tree.nodes.len(),
            "Loaded bookmarks"
        );

        Ok(Self {
            tree: RwLock::new(tree),
            file: Some(path),
        })
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

impl Default for InMemoryBookmarkStore {
    fn default() -> Self {
        Self::with_default_tree()
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn get_children(&self, folder_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let tree = self.tree.read().await;
        let folder = tree
            .nodes
            .get(folder_id)
            .ok_or_else(|| StoreError::NotFound(format!("bookmark {folder_id}")))?;
        if !folder.is_folder() {
            return Err(StoreError::Invalid(format!("{folder_id} is not a folder")));
        }

        Ok(tree
            .children
            .get(folder_id)
            .map(|ids| ids.iter().filter_map(|id| tree.nodes.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn get(&self, id: &str) -> Result<Option<Bookmark>, StoreError> {
        Ok(self.tree.read().await.nodes.get(id).cloned())
    }

    async fn update(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, StoreError> {
        let mut tree = self.tree.write().await;
        let current = tree
            .nodes
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("bookmark {id}")))?;

        let mut updated = current.clone();
        if let Some(title) = changes.title {
            updated.title = title;
        }
        if let Some(url) = changes.url {
            if updated.is_folder() {
                return Err(StoreError::Invalid("folders cannot have a URL".to_string()));
            }
            updated.url = Some(validate_url(&url)?);
        }

        match &self.file {
            Some(path) => {
                let mut next = tree.clone();
                next.nodes.insert(id.to_string(), updated.clone());
                let content = serde_json::to_vec_pretty(&next.to_nodes())?;
                write_atomically(path, &content).await?;
                *tree = next;
            }
            None => {
                tree.nodes.insert(id.to_string(), updated.clone());
            }
        }

        tracing::info!(id, title = %updated.title, "Bookmark updated");
        Ok(updated)
    }

    async fn get_tree(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        Ok(self.tree.read().await.to_nodes())
    }
}

fn validate_url(url: &str) -> Result<String, StoreError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid("URL must not be empty".to_string()));
    }
    Url::parse(trimmed).map_err(|e| StoreError::Invalid(format!("invalid URL {trimmed:?}: {e}")))?;
    Ok(trimmed.to_string())
}

fn default_tree() -> Vec<BookmarkNode> {
    let folders = [
        (MENU_ID, "Bookmarks Menu"),
        (TOOLBAR_ID, "Bookmarks Toolbar"),
        (UNFILED_ID, "Other Bookmarks"),
        (MOBILE_ID, "Mobile Bookmarks"),
    ];
    let children = folders
        .into_iter()
        .map(|(id, title)| BookmarkNode::new(Bookmark::folder(id, title)))
        .collect();
    vec![BookmarkNode::new(Bookmark::folder(ROOT_ID, "")).with_children(children)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookmarkKind;

    fn sample() -> Vec<BookmarkNode> {
        vec![BookmarkNode::new(Bookmark::folder("root", "")).with_children(vec![
            BookmarkNode::new(Bookmark::folder("toolbar", "Bookmarks Toolbar")).with_children(vec![
                BookmarkNode::new(Bookmark::link("b1", "Rust", "https://www.rust-lang.org/")),
                BookmarkNode::new(Bookmark::folder("f1", "News")).with_children(vec![
                    BookmarkNode::new(Bookmark::link("b2", "LWN", "https://lwn.net/")),
                ]),
            ]),
        ])]
    }

    fn changes(title: Option<&str>, url: Option<&str>) -> BookmarkChanges {
        BookmarkChanges {
            title: title.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_children_in_order_with_parent_ids() {
        let store = InMemoryBookmarkStore::from_tree(sample()).unwrap();
        let children = store.get_children("toolbar").await.unwrap();

        let ids: Vec<&str> = children.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "f1"]);
        assert!(children
            .iter()
            .all(|b| b.parent_id.as_deref() == Some("toolbar")));
        assert_eq!(children[1].kind, BookmarkKind::Folder);
    }

    #[tokio::test]
    async fn test_get_children_errors() {
        let store = InMemoryBookmarkStore::from_tree(sample()).unwrap();
        assert!(matches!(
            store.get_children("nope").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get_children("b1").await,
            Err(StoreError::Invalid(_))
        ));
        assert!(store.get_children("root").await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_tree_round_trip() {
        let store = InMemoryBookmarkStore::from_tree(sample()).unwrap();
        let tree = store.get_tree().await.unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].bookmark.parent_id, None);
        let toolbar = &tree[0].children[0];
        assert_eq!(toolbar.children.len(), 2);
        assert_eq!(toolbar.children[1].children[0].bookmark.id, "b2");
    }

    #[tokio::test]
    async fn test_update_title_and_url() {
        let store = InMemoryBookmarkStore::from_tree(sample()).unwrap();

        let updated = store
            .update("b1", changes(Some("Rust Lang"), Some(" https://rust-lang.org/ ")))
            .await
            .unwrap();
        assert_eq!(updated.title, "Rust Lang");
        assert_eq!(updated.url.as_deref(), Some("https://rust-lang.org/"));
        assert_eq!(store.get("b1").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let store = InMemoryBookmarkStore::from_tree(sample()).unwrap();

        assert!(matches!(
            store.update("missing", changes(Some("x"), None)).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update("f1", changes(None, Some("https://a.test"))).await,
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.update("b1", changes(None, Some("  "))).await,
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.update("b1", changes(None, Some("not a url"))).await,
            Err(StoreError::Invalid(_))
        ));

        let folder = store.update("f1", changes(Some("Reading"), None)).await.unwrap();
        assert_eq!(folder.title, "Reading");
        assert_eq!(folder.url, None);

        // Failed updates leave the node alone
        let b1 = store.get("b1").await.unwrap().unwrap();
        assert_eq!(b1.url.as_deref(), Some("https://www.rust-lang.org/"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_trees() {
        let duplicate = vec![BookmarkNode::new(Bookmark::folder("a", "")).with_children(vec![
            BookmarkNode::new(Bookmark::link("x", "1", "https://1.test")),
            BookmarkNode::new(Bookmark::link("x", "2", "https://2.test")),
        ])];
        assert!(InMemoryBookmarkStore::from_tree(duplicate).is_err());

        let leaf_with_children = vec![BookmarkNode::new(Bookmark::link(
            "a",
            "A",
            "https://a.test",
        ))
        .with_children(vec![BookmarkNode::new(Bookmark::folder("b", ""))])];
        assert!(InMemoryBookmarkStore::from_tree(leaf_with_children).is_err());
    }

    #[tokio::test]
    async fn test_default_tree_has_toolbar() {
        let store = InMemoryBookmarkStore::default();
        let top = store.get_children(ROOT_ID).await.unwrap();
        assert!(top.iter().any(|b| b.title == "Bookmarks Toolbar"));
        assert!(store.get_children(TOOLBAR_ID).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        std::fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let store = InMemoryBookmarkStore::load(&path).await.unwrap();
        store
            .update("b2", changes(Some("LWN.net"), None))
            .await
            .unwrap();
        drop(store);

        let reloaded = InMemoryBookmarkStore::load(&path).await.unwrap();
        let b2 = reloaded.get("b2").await.unwrap().unwrap();
        assert_eq!(b2.title, "LWN.net");
        assert_eq!(b2.parent_id.as_deref(), Some("f1"));
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_default_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryBookmarkStore::load(dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(store.get(TOOLBAR_ID).await.unwrap().is_some());
    }
}
