pub mod pixel_analyzer;
pub mod presentation;

pub use pixel_analyzer::{analyze, analyze_in_background, is_dark, PixelStats, DARK_THRESHOLD};
pub use presentation::{
    BackgroundRenderer, BackgroundSnapshot, Presentation, PresentationRenderer, RenderError,
    IMAGE_URL_PREFIX,
};
