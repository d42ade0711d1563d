use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default icon proxy endpoint (keyed by hostname)
pub const DEFAULT_ICON_PROXY_BASE: &str = "https://icon.horse/icon";

/// Default favicon service endpoint (keyed by hostname, fixed size)
pub const DEFAULT_FAVICON_SERVICE_BASE: &str = "https://www.google.com/s2/favicons";

/// Icon size requested from the favicon service
pub const DEFAULT_FAVICON_SIZE: u32 = 128;

/// A displayable icon, encoded the same way it is cached: a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IconImage(String);

impl IconImage {
    /// Encode raw bytes as a base64 `data:` URL with the given MIME type
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{mime};base64,{payload}"))
    }

    /// Wrap a stored value, rejecting anything that is not a data URL
    pub fn from_data_url(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.starts_with("data:") && value.contains(',') {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// MIME type declared in the data URL header
    pub fn mime_type(&self) -> &str {
        let header = self.body().split(',').next().unwrap_or("");
        header.split(';').next().unwrap_or("")
    }

    /// Decode the payload back to raw bytes
    pub fn decode(&self) -> Option<Vec<u8>> {
        let (header, payload) = self.body().split_once(',')?;
        if !header.ends_with(";base64") {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .ok()
    }

    fn body(&self) -> &str {
        self.0.strip_prefix("data:").unwrap_or(&self.0)
    }
}

/// The origin and hostname an icon lookup is keyed by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTarget {
    /// `scheme://host[:port]`, default ports omitted
    pub origin: String,
    pub hostname: String,
}

impl IconTarget {
    /// Derive the target from a page URL.
    ///
    /// Returns `None` for unparsable URLs and URLs without a network
    /// origin (`about:`, `javascript:`, `data:` and friends).
    pub fn from_page_url(page_url: &str) -> Option<Self> {
        let url = Url::parse(page_url.trim()).ok()?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return None;
        }
        let hostname = url.host_str()?.to_string();
        Some(Self {
            origin: origin.ascii_serialization(),
            hostname,
        })
    }
}

/// One remote icon source, tried in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconSource {
    /// `{origin}/apple-touch-icon.png` on the site itself
    AppleTouchIcon,

    /// Third-party icon proxy: `{base}/{hostname}`
    IconProxy {
        #[serde(default = "default_icon_proxy_base")]
        base: String,
    },

    /// Third-party favicon service: `{base}?domain={hostname}&sz={size}`
    FaviconService {
        #[serde(default = "default_favicon_service_base")]
        base: String,
        #[serde(default = "default_favicon_size")]
        size: u32,
    },
}

fn default_icon_proxy_base() -> String {
    DEFAULT_ICON_PROXY_BASE.to_string()
}

fn default_favicon_service_base() -> String {
    DEFAULT_FAVICON_SERVICE_BASE.to_string()
}

fn default_favicon_size() -> u32 {
    DEFAULT_FAVICON_SIZE
}

impl IconSource {
    /// The built-in source chain, highest priority first
    pub fn defaults() -> Vec<IconSource> {
        vec![
            IconSource::AppleTouchIcon,
            IconSource::IconProxy {
                base: default_icon_proxy_base(),
            },
            IconSource::FaviconService {
                base: default_favicon_service_base(),
                size: DEFAULT_FAVICON_SIZE,
            },
        ]
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            IconSource::AppleTouchIcon => "apple_touch_icon",
            IconSource::IconProxy { .. } => "icon_proxy",
            IconSource::FaviconService { .. } => "favicon_service",
        }
    }

    /// URL to request for the given target
    pub fn request_url(&self, target: &IconTarget) -> String {
        match self {
            IconSource::AppleTouchIcon => format!("{}/apple-touch-icon.png", target.origin),
            IconSource::IconProxy { base } => {
                format!("{}/{}", base.trim_end_matches('/'), target.hostname)
            }
            IconSource::FaviconService { base, size } => {
                format!("{}?domain={}&sz={}", base, target.hostname, size)
            }
        }
    }
}
