//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── clean_output()          remove + recreate the output dir
//!     │
//!     ├── rayon::join
//!     │       ├── build_html()    <load> includes → path rewrites → index.html
//!     │       └── build_css()     @import bundle → strip comments → styles.css
//!     │
//!     └── copy_static()           dirs, root files, manifest, server files
//!                                 (per-file failures are logged, not fatal)
//! ```

use crate::{
    compiler::{
        BuildError, CssBundler, IncludeResolver,
        assets::{self, CopyReport},
        css::strip_comments,
        rewrite,
    },
    config::SiteConfig,
    log,
    utils::minify::minify_page,
};
use anyhow::{Context, Result};
use std::{
    error::Error as _,
    fs,
    path::{Path, PathBuf},
};

/// Summary of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// `<load>` tags resolved into the entry page.
    pub includes: usize,
    /// Stylesheets inlined into the bundle, entry included.
    pub stylesheets: usize,
    /// Static files written verbatim (or with rewritten paths).
    pub copied: usize,
    /// Non-fatal copy failures, already logged.
    pub failures: Vec<BuildError>,
}

/// Build the entire site into `config.build.output`.
///
/// HTML and CSS are assembled in parallel; an error in either aborts the
/// build. Static copies run afterwards and never fail the build.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let output = config.output_dir();
    clean_output(&output)?;

    let (html_result, css_result) = rayon::join(
        || build_html(config, &output),
        || build_css(config, &output),
    );
    let includes = html_result?;
    let stylesheets = css_result?;

    let copy = copy_static(config, &output);
    for failure in &copy.failures {
        log!("warn"; "{}", describe(failure));
    }

    let report = BuildReport {
        includes,
        stylesheets,
        copied: copy.copied,
        failures: copy.failures,
    };
    log!("build"; "done → {} ({} files copied, {} skipped)",
        output.display(), report.copied, report.failures.len());

    Ok(report)
}

/// Remove the output directory if present, then recreate it empty.
fn clean_output(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clear output directory: {}", output.display())
        })?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

/// Assemble the entry page. Returns the number of includes resolved.
fn build_html(config: &SiteConfig, output: &Path) -> Result<usize> {
    let root = config.get_root();
    let entry = root.join(&config.build.entry_html);

    let html = fs::read_to_string(&entry)
        .map_err(|err| BuildError::Io(entry.clone(), err))
        .with_context(|| format!("Failed to read entry page {}", entry.display()))?;

    let resolved = IncludeResolver::new(config.build.max_passes)
        .resolve(&html, root)
        .with_context(|| format!("Failed to assemble {}", entry.display()))?;
    log!("html"; "resolved {} includes (depth {})", resolved.includes, resolved.depth);

    let html = rewrite::relativize_html(&resolved.html);
    let html = if config.build.strip_runtime_loader {
        rewrite::strip_runtime_loader(&html).into_owned()
    } else {
        html.into_owned()
    };
    let html = minify_page(&html, &config.build);

    write_output(&output.join(&config.build.entry_html), html.as_bytes())?;
    Ok(resolved.includes)
}

/// Bundle the entry stylesheet. Returns the number of stylesheets inlined.
fn build_css(config: &SiteConfig, output: &Path) -> Result<usize> {
    let entry = config.get_root().join(&config.build.entry_css);

    let mut bundler = CssBundler::new();
    let bundled = bundler
        .bundle(&entry)
        .with_context(|| format!("Failed to bundle {}", entry.display()))?;
    // Nested imports are stripped per file; this pass catches anything that
    // only forms a comment once the files are joined.
    let cleaned = strip_comments(&bundled);
    log!("css"; "bundled {} stylesheets", bundler.visited());

    write_output(&output.join(&config.build.entry_css), cleaned.as_bytes())?;
    Ok(bundler.visited())
}

/// Copy directories, root files, the manifest and server files.
fn copy_static(config: &SiteConfig, output: &Path) -> CopyReport {
    let root = config.get_root();
    let build = &config.build;
    let mut report = CopyReport::default();

    for dir in &build.dirs {
        assets::copy_dir(&root.join(dir), &output.join(dir), &mut report);
    }
    assets::copy_files(root, output, &build.files, &mut report);
    assets::write_manifest(root, output, &build.manifest, &mut report);
    assets::copy_files(root, output, &build.server_files, &mut report);

    log!("assets"; "copied {} files", report.copied);
    report
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
        .map_err(|err| BuildError::Io(PathBuf::from(path), err))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Error message with its immediate cause, e.g. `failed to copy x: No such file`.
fn describe(err: &BuildError) -> String {
    match err.source() {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, SiteConfig) {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "index.html",
            concat!(
                r#"<head><link rel="icon" href="/favicon.svg"><link rel="manifest" href="/site.webmanifest"></head>"#,
                r#"<body><load src="partials/hero.html" title="Willkommen"></load></body>"#,
            ),
        );
        write(root, "partials/hero.html", "<h1>{{title}}</h1>");
        write(
            root,
            "css/styles.css",
            "/* entry */@import 'base.css';\n.site{}",
        );
        write(root, "css/base.css", "body{margin:0}");
        write(root, "img/logo.png", "png");
        write(root, "js/main.js", "console.log(1)");
        write(root, "favicon.svg", "<svg/>");
        write(root, "sw.js", "self.addEventListener('fetch', () => {})");
        write(
            root,
            "site.webmanifest",
            r#"{"icons":[{"src":"/web-app-manifest-192x192.png"}]}"#,
        );
        write(root, "contact.php", "<?php");

        let mut config = SiteConfig::default();
        config.root = root.to_path_buf();
        (dir, config)
    }

    #[test]
    fn test_build_site_writes_flattened_output() {
        let (dir, config) = site();
        let report = build_site(&config).unwrap();
        let dist = dir.path().join("dist");

        let html = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(html.contains("<h1>Willkommen</h1>"));
        assert!(html.contains(r#"href="./favicon.svg""#));
        assert!(html.contains(r#"href="./site.webmanifest""#));
        assert!(!html.contains("<load"));

        let css = fs::read_to_string(dist.join("css/styles.css")).unwrap();
        assert_eq!(css, "body{margin:0}\n.site{}");

        assert_eq!(report.includes, 1);
        assert_eq!(report.stylesheets, 2);
    }

    #[test]
    fn test_build_site_copies_static_and_tolerates_missing() {
        let (dir, config) = site();
        let report = build_site(&config).unwrap();
        let dist = dir.path().join("dist");

        assert!(dist.join("img/logo.png").exists());
        assert!(dist.join("js/main.js").exists());
        assert!(dist.join("sw.js").exists());
        assert!(dist.join("contact.php").exists());
        assert_eq!(
            fs::read_to_string(dist.join("site.webmanifest")).unwrap(),
            r#"{"icons":[{"src":"./web-app-manifest-192x192.png"}]}"#
        );

        // favicon.ico, robots.txt, .htaccess ... are absent from the fixture
        assert!(!report.failures.is_empty());
        assert!(
            report
                .failures
                .iter()
                .all(|f| matches!(f, BuildError::StaticAssetCopyFailure { .. }))
        );
    }

    #[test]
    fn test_build_site_clears_previous_output() {
        let (dir, config) = site();
        write(dir.path(), "dist/stale.html", "old");

        build_site(&config).unwrap();
        assert!(!dir.path().join("dist/stale.html").exists());
    }

    #[test]
    fn test_build_site_missing_include_is_fatal() {
        let (dir, config) = site();
        fs::remove_file(dir.path().join("partials/hero.html")).unwrap();

        let err = build_site(&config).unwrap_err();
        assert!(err.chain().any(|e| matches!(
            e.downcast_ref::<BuildError>(),
            Some(BuildError::MissingIncludeFile { .. })
        )));
    }

    #[test]
    fn test_build_site_cyclic_include_is_fatal() {
        let (dir, mut config) = site();
        write(dir.path(), "partials/hero.html", r#"<load src="hero.html"></load>"#);
        config.build.max_passes = 10;

        let err = build_site(&config).unwrap_err();
        assert!(err.chain().any(|e| matches!(
            e.downcast_ref::<BuildError>(),
            Some(BuildError::RecursionLimitExceeded { .. })
        )));
    }

    #[test]
    fn test_build_site_missing_stylesheet_is_fatal() {
        let (dir, config) = site();
        fs::remove_file(dir.path().join("css/base.css")).unwrap();

        assert!(build_site(&config).is_err());
    }

    #[test]
    fn test_build_site_strips_runtime_loader() {
        let (dir, mut config) = site();
        write(
            dir.path(),
            "index.html",
            "<body><p>x</p><script src=\"./js/main.js\"></script></body>",
        );
        config.build.strip_runtime_loader = true;

        build_site(&config).unwrap();
        let html = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(html, "<body><p>x</p></body>");
    }
}
