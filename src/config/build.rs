//! `[build]` section configuration.
//!
//! Contains entry files, the output directory and the static asset lists
//! copied verbatim into the output tree.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in lander.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// output = "dist"
/// entry_html = "index.html"
/// entry_css = "css/styles.css"
/// dirs = ["img", "js"]
/// strip_runtime_loader = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory, relative to the project root.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Entry page whose `<load>` tags are resolved.
    #[serde(default = "defaults::build::entry_html")]
    #[educe(Default = defaults::build::entry_html())]
    pub entry_html: PathBuf,

    /// Entry stylesheet whose `@import` chain is flattened.
    /// The bundle is written to the same relative path under the output.
    #[serde(default = "defaults::build::entry_css")]
    #[educe(Default = defaults::build::entry_css())]
    pub entry_css: PathBuf,

    /// Directories copied recursively. Missing ones are skipped.
    #[serde(default = "defaults::build::dirs")]
    #[educe(Default = defaults::build::dirs())]
    pub dirs: Vec<PathBuf>,

    /// Root files (icons, robots.txt, service worker, ...) copied one by one.
    #[serde(default = "defaults::build::files")]
    #[educe(Default = defaults::build::files())]
    pub files: Vec<PathBuf>,

    /// Server-side files copied after everything else.
    #[serde(default = "defaults::build::server_files")]
    #[educe(Default = defaults::build::server_files())]
    pub server_files: Vec<PathBuf>,

    /// Web manifest whose icon paths are rewritten to relative form.
    #[serde(default = "defaults::build::manifest")]
    #[educe(Default = defaults::build::manifest())]
    pub manifest: PathBuf,

    /// Upper bound on include resolutions per document level and on nesting depth.
    #[serde(default = "defaults::build::max_passes")]
    #[educe(Default = defaults::build::max_passes())]
    pub max_passes: usize,

    /// Minify the assembled HTML.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Drop the `<script src="./js/main.js">` runtime loader from the built page.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub strip_runtime_loader: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.entry_html, PathBuf::from("index.html"));
        assert_eq!(config.build.entry_css, PathBuf::from("css/styles.css"));
        assert_eq!(config.build.dirs, vec![PathBuf::from("img"), PathBuf::from("js")]);
        assert!(config.build.files.contains(&PathBuf::from("sw.js")));
        assert_eq!(config.build.max_passes, 200);
        assert!(!config.build.minify);
        assert!(!config.build.strip_runtime_loader);
    }

    #[test]
    fn test_build_config_custom() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build]
            output = "public"
            dirs = ["images"]
            files = ["robots.txt"]
            server_files = []
            max_passes = 16
            strip_runtime_loader = true
        "#,
        )
        .unwrap();

        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.dirs, vec![PathBuf::from("images")]);
        assert_eq!(config.build.files, vec![PathBuf::from("robots.txt")]);
        assert!(config.build.server_files.is_empty());
        assert_eq!(config.build.max_passes, 16);
        assert!(config.build.strip_runtime_loader);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [build]
            tailwind = true
        "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }
}
