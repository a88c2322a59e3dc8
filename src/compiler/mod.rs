//! Page and stylesheet assembly.
//!
//! - **include**: Resolve `<load>` tags with placeholder substitution
//! - **css**: Flatten `@import` chains into one stylesheet
//! - **rewrite**: Relative icon/manifest paths for subdirectory deployment
//! - **assets**: Best-effort verbatim copies of static files
//!
//! # Build Flow
//!
//! ```text
//! index.html ──► IncludeResolver ──► rewrite ──► dist/index.html
//! styles.css ──► CssBundler ──► strip_comments ──► dist/css/styles.css
//! img/ js/ icons ──► assets ──► dist/...
//! ```

pub mod assets;
pub mod css;
mod error;
pub mod include;
pub mod rewrite;

pub use css::CssBundler;
pub use error::BuildError;
pub use include::IncludeResolver;

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// Works for files that do not exist yet, unlike `canonicalize`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` stays `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/site/css/./parts/../base.css")),
            PathBuf::from("/site/css/base.css")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent() {
        assert_eq!(normalize(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }
}
