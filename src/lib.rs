//! Newtab - bookmark grid new-tab page
//!
//! Favicon resolution with per-origin caching, background image analysis
//! and theming, and bookmark browsing behind a small HTTP API.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
