//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn entry_html() -> PathBuf {
        "index.html".into()
    }

    pub fn entry_css() -> PathBuf {
        "css/styles.css".into()
    }

    pub fn manifest() -> PathBuf {
        "site.webmanifest".into()
    }

    pub fn max_passes() -> usize {
        200
    }

    pub fn dirs() -> Vec<PathBuf> {
        vec!["img".into(), "js".into()]
    }

    pub fn files() -> Vec<PathBuf> {
        [
            "favicon.ico",
            "favicon.svg",
            "favicon-96x96.png",
            "apple-touch-icon.png",
            "web-app-manifest-192x192.png",
            "web-app-manifest-512x512.png",
            "robots.txt",
            "sitemap.xml",
            "sw.js",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    }

    pub fn server_files() -> Vec<PathBuf> {
        vec![".htaccess".into(), "contact.php".into()]
    }
}

// ============================================================================
// [cache] Section Defaults
// ============================================================================

pub mod cache {
    use crate::cache::Destination;

    pub fn version() -> String {
        "v1.1.0".into()
    }

    pub fn prefix() -> String {
        "static-".into()
    }

    pub fn scope() -> String {
        "http://localhost/".into()
    }

    pub fn fallback() -> String {
        "./index.html".into()
    }

    pub fn revalidate_prefix() -> String {
        "/partials/".into()
    }

    pub fn precache() -> Vec<String> {
        [
            "./index.html",
            "./css/styles.css",
            "./js/main.js",
            "./img/HUV_logo.png",
            "./favicon.ico",
            "./favicon.svg",
            "./favicon-96x96.png",
            "./apple-touch-icon.png",
            "./site.webmanifest",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    pub fn destinations() -> Vec<Destination> {
        vec![
            Destination::Style,
            Destination::Script,
            Destination::Image,
            Destination::Font,
        ]
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }

    pub fn contact_endpoint() -> String {
        "/contact.php".into()
    }
}
