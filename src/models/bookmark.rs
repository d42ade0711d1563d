use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a node is a leaf bookmark or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkKind {
    Bookmark,
    Folder,
}

/// A bookmark or folder as exposed by the bookmark store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: BookmarkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Bookmark {
    pub fn folder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            kind: BookmarkKind::Folder,
            parent_id: None,
        }
    }

    pub fn link(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            kind: BookmarkKind::Bookmark,
            parent_id: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == BookmarkKind::Folder
    }

    /// Title shown under the grid tile: the title, or the URL when untitled
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            self.url.as_deref().unwrap_or("")
        } else {
            &self.title
        }
    }

    /// Glyph shown when no favicon is available
    pub fn placeholder(&self) -> String {
        placeholder_glyph(&self.title)
    }
}

/// A node of the bookmark tree, as returned by `get_tree`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    pub fn new(bookmark: Bookmark) -> Self {
        Self {
            bookmark,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<BookmarkNode>) -> Self {
        self.children = children;
        self
    }
}

/// Fields the edit form may change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookmarkChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// First character of the title, uppercased; `?` when the title is empty
pub fn placeholder_glyph(title: &str) -> String {
    match title.chars().next() {
        Some(c) => c.to_uppercase().collect(),
        None => "?".to_string(),
    }
}
