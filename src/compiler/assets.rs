use super::BuildError;
use super::rewrite::relativize_manifest;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
pub const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Result of the best-effort copy phase.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub copied: usize,
    pub failures: Vec<BuildError>,
}

impl CopyReport {
    fn record(&mut self, result: Result<(), BuildError>) {
        match result {
            Ok(()) => self.copied += 1,
            Err(err) => self.failures.push(err),
        }
    }
}

/// Copy one file, creating parent directories as needed.
pub fn copy_file(src: &Path, dest: &Path) -> Result<(), BuildError> {
    let copy = || -> std::io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        Ok(())
    };
    copy().map_err(|source| BuildError::StaticAssetCopyFailure {
        path: src.to_path_buf(),
        source,
    })
}

/// Copy a directory tree. A missing source directory is skipped.
pub fn copy_dir(src: &Path, dest: &Path, report: &mut CopyReport) {
    if !src.is_dir() {
        return;
    }

    for entry in WalkDir::new(src) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map_or_else(|| src.to_path_buf(), PathBuf::from);
                report.failures.push(BuildError::StaticAssetCopyFailure {
                    path,
                    source: err.into(),
                });
                continue;
            }
        };

        let name = entry.file_name().to_str().unwrap_or_default();
        if !entry.file_type().is_file() || IGNORED_FILES.contains(&name) {
            continue;
        }

        // WalkDir only yields paths under `src`
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        report.record(copy_file(entry.path(), &dest.join(rel)));
    }
}

/// Copy individually listed files from `root` into `output`.
pub fn copy_files(root: &Path, output: &Path, files: &[PathBuf], report: &mut CopyReport) {
    for file in files {
        report.record(copy_file(&root.join(file), &output.join(file)));
    }
}

/// Write the web manifest with its icon paths made relative.
pub fn write_manifest(root: &Path, output: &Path, manifest: &Path, report: &mut CopyReport) {
    let src = root.join(manifest);
    let dest = output.join(manifest);

    let rewrite = || -> std::io::Result<()> {
        let content = fs::read_to_string(&src)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, relativize_manifest(&content).as_bytes())
    };

    report.record(
        rewrite().map_err(|source| BuildError::StaticAssetCopyFailure { path: src, source }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_dir_recursive() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        fs::create_dir_all(src.path().join("icons")).unwrap();
        fs::write(src.path().join("logo.png"), b"png").unwrap();
        fs::write(src.path().join("icons/a.svg"), b"<svg/>").unwrap();
        fs::write(src.path().join(".DS_Store"), b"").unwrap();

        let mut report = CopyReport::default();
        copy_dir(src.path(), &dest.path().join("img"), &mut report);

        assert_eq!(report.copied, 2);
        assert!(report.failures.is_empty());
        assert_eq!(fs::read(dest.path().join("img/icons/a.svg")).unwrap(), b"<svg/>");
        assert!(!dest.path().join("img/.DS_Store").exists());
    }

    #[test]
    fn test_copy_dir_missing_is_skipped() {
        let dest = tempdir().unwrap();
        let mut report = CopyReport::default();
        copy_dir(&dest.path().join("nope"), &dest.path().join("out"), &mut report);

        assert_eq!(report.copied, 0);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_copy_files_records_missing_and_continues() {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(root.path().join("robots.txt"), "User-agent: *").unwrap();

        let files = vec![PathBuf::from("favicon.ico"), PathBuf::from("robots.txt")];
        let mut report = CopyReport::default();
        copy_files(root.path(), out.path(), &files, &mut report);

        assert_eq!(report.copied, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            BuildError::StaticAssetCopyFailure { path, .. } if path.ends_with("favicon.ico")
        ));
        assert!(out.path().join("robots.txt").exists());
    }

    #[test]
    fn test_write_manifest_relativizes_icons() {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(
            root.path().join("site.webmanifest"),
            r#"{"icons":[{"src":"/web-app-manifest-512x512.png"}]}"#,
        )
        .unwrap();

        let mut report = CopyReport::default();
        write_manifest(root.path(), out.path(), Path::new("site.webmanifest"), &mut report);

        assert_eq!(report.copied, 1);
        assert_eq!(
            fs::read_to_string(out.path().join("site.webmanifest")).unwrap(),
            r#"{"icons":[{"src":"./web-app-manifest-512x512.png"}]}"#
        );
    }
}
