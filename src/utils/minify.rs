//! HTML minification, enabled by `[build] minify`.

use crate::config::BuildConfig;
use std::borrow::Cow;

/// Minify the assembled page if the config asks for it.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify_page<'a>(html: &'a str, config: &BuildConfig) -> Cow<'a, str> {
    if !config.minify {
        return Cow::Borrowed(html);
    }
    let minified = minify_html_inner(html.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&minified).into_owned())
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minify(enabled: bool) -> BuildConfig {
        BuildConfig {
            minify: enabled,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_minify_page_enabled() {
        let html = "<html>\n  <body>\n    <p>Hello World</p>\n  </body>\n</html>";
        let minified = minify_page(html, &config_with_minify(true));

        assert!(minified.len() < html.len());
        assert!(minified.contains("<p>Hello World</p>"));
    }

    #[test]
    fn test_minify_page_disabled() {
        let html = "<html>\n  <body>\n  </body>\n</html>";
        let result = minify_page(html, &config_with_minify(false));

        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, html);
    }
}
