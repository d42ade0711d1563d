use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// Storage keys for the current background.
///
/// The asset lives in the blob store; the remaining keys live in the
/// key-value store next to the favicon cache entries.
pub mod keys {
    /// Blob store key for the raw background image
    pub const BACKGROUND_IMAGE: &str = "backgroundImage";

    /// Key-value key for the dark classification (bool)
    pub const IS_DARK: &str = "isBackgroundImageDark";

    /// Key-value key for the fit preference ("cover", "contain", "stretch")
    pub const FIT_MODE: &str = "backgroundFit";

    /// Key-value key for the average color (CSS `rgb(r, g, b)`)
    pub const AVERAGE_COLOR: &str = "averageBackgroundColor";

    /// Every key-value key that belongs to the background metadata
    pub const METADATA: [&str; 3] = [IS_DARK, FIT_MODE, AVERAGE_COLOR];
}

/// How the background image is sized against the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Cover,
    Contain,
    Stretch,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Stretch => "stretch",
        }
    }

    /// Parse a stored fit value. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cover" => Some(FitMode::Cover),
            "contain" => Some(FitMode::Contain),
            "stretch" => Some(FitMode::Stretch),
            _ => None,
        }
    }

    /// CSS `background-size` value for this mode
    pub fn background_size(&self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Stretch => "100% 100%",
        }
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS functional notation, e.g. `rgb(12, 34, 56)`
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Parse the CSS functional notation written by [`Rgb::to_css`].
    pub fn parse_css(s: &str) -> Option<Self> {
        let inner = s.trim().strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>());
        let r = parts.next()?.ok()?;
        let g = parts.next()?.ok()?;
        let b = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Derived metadata for the current background asset.
///
/// Missing or malformed stored values fall back to the defaults used for
/// rendering: `cover`, not dark, no color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackgroundMetadata {
    pub fit_mode: FitMode,
    pub is_dark: bool,
    pub average_color: Option<Rgb>,
}

impl BackgroundMetadata {
    /// Read metadata from key-value entries
    pub fn from_entries(entries: &HashMap<String, Value>) -> Self {
        let fit_mode = entries
            .get(keys::FIT_MODE)
            .and_then(Value::as_str)
            .and_then(FitMode::parse)
            .unwrap_or_default();
        let is_dark = entries
            .get(keys::IS_DARK)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let average_color = entries
            .get(keys::AVERAGE_COLOR)
            .and_then(Value::as_str)
            .and_then(Rgb::parse_css);

        Self {
            fit_mode,
            is_dark,
            average_color,
        }
    }

    /// Key-value entries for this metadata
    pub fn to_entries(&self) -> HashMap<String, Value> {
        let mut entries = HashMap::new();
        entries.insert(
            keys::FIT_MODE.to_string(),
            Value::String(self.fit_mode.as_str().to_string()),
        );
        entries.insert(keys::IS_DARK.to_string(), Value::Bool(self.is_dark));
        if let Some(color) = self.average_color {
            entries.insert(keys::AVERAGE_COLOR.to_string(), Value::String(color.to_css()));
        }
        entries
    }
}
