//! Embedded UI assets for single-binary distribution
//!
//! Uses rust-embed to compile the page, stylesheet, and built WASM bundle
//! into the binary. In debug mode, files are loaded from disk for
//! hot-reloading. In release mode, files are embedded in the binary.

use rust_embed::RustEmbed;

/// Embedded UI assets from the assets/ directory
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "index.html"]
#[include = "style.css"]
#[include = "pkg/*"]
pub struct UiAssets;

/// Get a file from embedded assets with proper MIME type
pub fn get_asset(path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Handle root path
    let path = if path.is_empty() || path == "/" {
        "index.html"
    } else {
        path.trim_start_matches('/')
    };

    UiAssets::get(path).map(|file| {
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        (file.data.into_owned(), mime)
    })
}
