//! Stylesheet bundling: flatten an `@import` chain into one file.
//!
//! Comments are stripped before imports are scanned, so an import inside
//! `/* ... */` is never followed. Each file is expanded at most once; a
//! repeated or cyclic import is replaced by nothing, which keeps the first
//! occurrence and with it the cascade order.

use super::{BuildError, normalize};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// `@import url("p");`, `@import url(p);`, `@import "p";`, `@import 'p';`
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*["']?([^"')]+?)["']?\s*\)|["']([^"']+)["'])\s*;"#).unwrap()
});

/// Remove every `/* ... */` block comment.
pub fn strip_comments(css: &str) -> Cow<'_, str> {
    COMMENT_RE.replace_all(css, "")
}

/// Imports that point off-site and cannot be read from disk.
fn is_remote(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("//")
}

/// Bundles stylesheets, remembering which files were already emitted.
#[derive(Debug, Default)]
pub struct CssBundler {
    visited: FxHashSet<PathBuf>,
}

impl CssBundler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `entry` and everything it imports.
    pub fn bundle(&mut self, entry: &Path) -> Result<String, BuildError> {
        let path = normalize(entry);
        if !self.visited.insert(path.clone()) {
            return Ok(String::new());
        }

        let raw = fs::read_to_string(&path)
            .map_err(|err| BuildError::MissingStylesheet(path.clone(), err))?;
        let stripped = strip_comments(&raw);
        let css: &str = &stripped;
        let dir = path.parent().unwrap_or(Path::new(""));

        let mut out = String::with_capacity(css.len());
        let mut last = 0;
        for caps in IMPORT_RE.captures_iter(css) {
            let Some(directive) = caps.get(0) else { continue };
            let Some(target) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let target = target.as_str().trim();

            out.push_str(&css[last..directive.start()]);
            if is_remote(target) {
                out.push_str(directive.as_str());
            } else {
                out.push_str(&self.bundle(&dir.join(target))?);
            }
            last = directive.end();
        }
        out.push_str(&css[last..]);

        Ok(out)
    }

    /// Files emitted so far, in no particular order.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_strip_comments_multiline() {
        assert_eq!(strip_comments("a/* x\n y */b/**/c"), "abc");
    }

    #[test]
    fn test_bundle_all_import_forms_in_order() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "styles.css",
            "@import url(\"a.css\");\n@import url(b.css);\n@import \"c.css\";\n@import 'd.css';\nbody{}",
        );
        write(dir.path(), "a.css", ".a{}");
        write(dir.path(), "b.css", ".b{}");
        write(dir.path(), "c.css", ".c{}");
        write(dir.path(), "d.css", ".d{}");

        let out = CssBundler::new().bundle(&dir.path().join("styles.css")).unwrap();
        assert_eq!(out, ".a{}\n.b{}\n.c{}\n.d{}\nbody{}");
    }

    #[test]
    fn test_bundle_resolves_relative_to_importer() {
        let dir = tempdir().unwrap();
        write(dir.path(), "css/styles.css", "@import 'parts/base.css';");
        write(dir.path(), "css/parts/base.css", "@import '../tokens.css';.base{}");
        write(dir.path(), "css/tokens.css", ":root{}");

        let out = CssBundler::new()
            .bundle(&dir.path().join("css/styles.css"))
            .unwrap();
        assert_eq!(out, ":root{}.base{}");
    }

    #[test]
    fn test_bundle_cycle_emits_each_file_once() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.css", "@import 'b.css';.a{}");
        write(dir.path(), "b.css", "@import 'a.css';.b{}");

        let mut bundler = CssBundler::new();
        let out = bundler.bundle(&dir.path().join("a.css")).unwrap();
        assert_eq!(out, ".b{}.a{}");
        assert_eq!(bundler.visited(), 2);
    }

    #[test]
    fn test_bundle_duplicate_import_is_dropped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "main.css", "@import 'x.css';@import './x.css';.m{}");
        write(dir.path(), "x.css", ".x{}");

        let out = CssBundler::new().bundle(&dir.path().join("main.css")).unwrap();
        assert_eq!(out, ".x{}.m{}");
    }

    #[test]
    fn test_bundle_ignores_commented_import() {
        let dir = tempdir().unwrap();
        // x.css does not exist: following the import would fail the build
        write(dir.path(), "main.css", "/* @import \"x.css\"; */.m{}");

        let out = CssBundler::new().bundle(&dir.path().join("main.css")).unwrap();
        assert_eq!(out, ".m{}");
    }

    #[test]
    fn test_bundle_keeps_remote_import() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "main.css",
            "@import url(\"https://fonts.example.com/inter.css\");.m{}",
        );

        let out = CssBundler::new().bundle(&dir.path().join("main.css")).unwrap();
        assert_eq!(out, "@import url(\"https://fonts.example.com/inter.css\");.m{}");
    }

    #[test]
    fn test_bundle_missing_import_is_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path(), "main.css", "@import 'gone.css';");

        let err = CssBundler::new()
            .bundle(&dir.path().join("main.css"))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingStylesheet(ref p, _) if p.ends_with("gone.css")));
    }
}
