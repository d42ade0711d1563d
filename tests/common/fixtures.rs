//! Test fixtures and constants.

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use newtab::models::{Bookmark, BookmarkNode};
use std::io::Cursor;

/// Bookmark ids of the sample tree
pub mod ids {
    pub const ROOT: &str = "root________";
    pub const TOOLBAR: &str = "toolbar_____";
    pub const MENU: &str = "menu________";
    pub const RUST: &str = "bm-rust";
    pub const UNTITLED: &str = "bm-untitled";
    pub const NEWS: &str = "fd-news";
    pub const LOCAL: &str = "fd-local";
}

/// A uniformly colored PNG
pub fn png(r: u8, g: u8, b: u8) -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_pixel(16, 9, Rgba([r, g, b, 255]));
    encode(&img, ImageFormat::Png)
}

/// A uniformly colored opaque image in another container format
pub fn image_as(format: ImageFormat, r: u8, g: u8, b: u8) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_pixel(8, 8, Rgb([r, g, b]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("Failed to encode image");
    buf.into_inner()
}

fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("Failed to encode image");
    buf.into_inner()
}

/// Toolbar with two bookmarks and a folder of eleven news sites (one subfolder)
pub fn sample_tree() -> Vec<BookmarkNode> {
    let mut news: Vec<BookmarkNode> = (1..=10)
        .map(|i| {
            BookmarkNode::new(Bookmark::link(
                format!("bm-news-{i}"),
                format!("news {i}"),
                format!("https://news{i}.example/"),
            ))
        })
        .collect();
    news.push(
        BookmarkNode::new(Bookmark::folder(ids::LOCAL, "Local")).with_children(vec![
            BookmarkNode::new(Bookmark::link(
                "bm-local-1",
                "Town paper",
                "https://town.example/",
            )),
        ]),
    );

    vec![BookmarkNode::new(Bookmark::folder(ids::ROOT, "")).with_children(vec![
        BookmarkNode::new(Bookmark::folder(ids::MENU, "Bookmarks Menu")),
        BookmarkNode::new(Bookmark::folder(ids::TOOLBAR, "Bookmarks Toolbar")).with_children(vec![
            BookmarkNode::new(Bookmark::link(ids::RUST, "rust", "https://www.rust-lang.org/")),
            BookmarkNode::new(Bookmark::link(ids::UNTITLED, "", "https://example.com/")),
            BookmarkNode::new(Bookmark::folder(ids::NEWS, "News")).with_children(news),
        ]),
    ])]
}

/// The sample tree as the JSON a bookmarks file holds
pub fn sample_tree_json() -> String {
    serde_json::to_string_pretty(&sample_tree()).expect("Failed to serialize tree")
}
