//! Build error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling the output tree.
///
/// `StaticAssetCopyFailure` is the only non-fatal variant: the build records
/// it and keeps going. Everything else aborts the build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("include file not found: `{path}` (referenced from `{base}`)")]
    MissingIncludeFile {
        path: PathBuf,
        base: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "too many <load> replacements at `{include}` (included from `{base}`, limit {limit}, possible recursion)"
    )]
    RecursionLimitExceeded {
        include: PathBuf,
        base: PathBuf,
        limit: usize,
    },

    #[error("stylesheet not found: `{0}`")]
    MissingStylesheet(PathBuf, #[source] std::io::Error),

    #[error("failed to copy `{path}`")]
    StaticAssetCopyFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_build_error_display() {
        let err = BuildError::MissingIncludeFile {
            path: PathBuf::from("partials/header.html"),
            base: PathBuf::from("/site"),
            source: Error::new(ErrorKind::NotFound, "no such file"),
        };
        let display = err.to_string();
        assert!(display.contains("partials/header.html"));
        assert!(display.contains("/site"));

        let err = BuildError::RecursionLimitExceeded {
            include: PathBuf::from("/site/partials/loop.html"),
            base: PathBuf::from("/site/partials"),
            limit: 200,
        };
        let display = err.to_string();
        assert!(display.contains("200"));
        assert!(display.contains("/site/partials/loop.html"));
    }
}
