//! Literal path rewrites for subdirectory deployment.
//!
//! Root-absolute icon and manifest references (`/favicon.svg`) break when the
//! site is served from `https://host/some/dir/`. These rules turn a fixed set
//! of them into relative references (`./favicon.svg`).

use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

/// A single pattern → replacement rule, `$1` style captures allowed.
struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }
}

static HTML_RULES: LazyLock<[Rule; 3]> = LazyLock::new(|| {
    [
        Rule::new(r#"href="/(favicon[^"]+)""#, r#"href="./$1""#),
        Rule::new(
            r#"href="/apple-touch-icon\.png""#,
            r#"href="./apple-touch-icon.png""#,
        ),
        Rule::new(r#"href="/site\.webmanifest""#, r#"href="./site.webmanifest""#),
    ]
});

static MANIFEST_RULE: LazyLock<Rule> =
    LazyLock::new(|| Rule::new(r#""/(web-app-manifest-[^"]+)""#, r#""./$1""#));

static RUNTIME_LOADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script[^>]*src="\.\s*/js/main\.js"[^>]*>\s*</script>\s*"#).unwrap()
});

fn apply<'a>(input: Cow<'a, str>, rule: &Rule) -> Cow<'a, str> {
    let changed = match rule.pattern.replace_all(&input, rule.replacement) {
        Cow::Borrowed(_) => None,
        Cow::Owned(changed) => Some(changed),
    };
    changed.map_or(input, Cow::Owned)
}

/// Make favicon, touch icon and manifest links in the page relative.
pub fn relativize_html(html: &str) -> Cow<'_, str> {
    HTML_RULES
        .iter()
        .fold(Cow::Borrowed(html), |acc, rule| apply(acc, rule))
}

/// Make `web-app-manifest-*` icon paths in the web manifest relative.
pub fn relativize_manifest(manifest: &str) -> Cow<'_, str> {
    apply(Cow::Borrowed(manifest), &MANIFEST_RULE)
}

/// Remove the `<script src="./js/main.js"></script>` runtime include loader.
///
/// Only the first occurrence is dropped.
pub fn strip_runtime_loader(html: &str) -> Cow<'_, str> {
    RUNTIME_LOADER_RE.replace(html, "")
}
