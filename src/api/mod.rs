pub mod background;
pub mod bookmarks;
pub mod favicon;

pub use background::{
    __path_handle_background_image, __path_handle_get_background, __path_handle_reset_background,
    __path_handle_set_background, __path_handle_set_fit,
};
pub use background::{
    handle_background_image, handle_get_background, handle_reset_background,
    handle_set_background, handle_set_fit, BackgroundResponse, FitRequest, MAX_UPLOAD_BYTES,
};
pub use bookmarks::{__path_handle_folder, __path_handle_root_folder, __path_handle_update_bookmark};
pub use bookmarks::{handle_folder, handle_root_folder, handle_update_bookmark};
pub use favicon::{handle_favicon, FaviconQuery, FaviconResponse, __path_handle_favicon};
