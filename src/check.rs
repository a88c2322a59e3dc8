//! Precache verification against a built output directory.
//!
//! Installs and activates a [`CacheController`] whose network is the output
//! directory itself, so every precache entry the deployed site could not
//! serve shows up before release instead of as a warning in a browser.

use crate::{
    cache::{CacheController, CacheStorage, DirectoryNetwork, InstallOutcome},
    config::SiteConfig,
    log,
};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use url::Url;

/// Check the precache manifest against `config.build.output`.
///
/// Returns the number of entries stored, or an error listing how many
/// entries are missing.
pub fn check_site(config: &SiteConfig) -> Result<usize> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;

    let outcome = runtime.block_on(install_against_output(config))?;
    let total = config.cache.precache.len();

    if !outcome.missed.is_empty() {
        bail!(
            "{} of {} precache entries are missing from {}",
            outcome.missed.len(),
            total,
            config.output_dir().display()
        );
    }

    log!("check"; "all {} precache entries served by {}", outcome.stored, config.cache.bucket_name());
    Ok(outcome.stored)
}

async fn install_against_output(config: &SiteConfig) -> Result<InstallOutcome> {
    let output = config.output_dir();
    if !output.is_dir() {
        bail!(
            "Output directory {} not found, run `lander build` first",
            output.display()
        );
    }

    let origin = Url::parse(&config.cache.scope)
        .with_context(|| format!("Invalid cache scope `{}`", config.cache.scope))?;
    let network = Arc::new(DirectoryNetwork::new(&output, origin));
    let controller = CacheController::new(&config.cache, CacheStorage::new(), network)?;

    let outcome = controller.install().await?;
    controller.activate().await?;

    for miss in &outcome.missed {
        log!("check"; "missing {} ({})", miss.url, miss.reason);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config(root: &std::path::Path, precache: &[&str]) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.root = root.to_path_buf();
        config.cache.precache = precache.iter().map(|p| (*p).to_owned()).collect();
        config
    }

    #[test]
    fn test_check_passes_when_all_entries_exist() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(output.join("css")).unwrap();
        fs::write(output.join("index.html"), "<html>").unwrap();
        fs::write(output.join("css/styles.css"), "body{}").unwrap();

        let config = config(dir.path(), &["./index.html", "./css/styles.css"]);
        assert_eq!(check_site(&config).unwrap(), 2);
    }

    #[test]
    fn test_check_reports_missing_entries() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("index.html"), "<html>").unwrap();

        let config = config(dir.path(), &["./index.html", "./favicon.ico", "./favicon.svg"]);
        let err = check_site(&config).unwrap_err();
        assert!(err.to_string().starts_with("2 of 3 precache entries are missing"));
    }

    #[tokio::test]
    async fn test_install_lists_missing_urls() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();

        let config = config(dir.path(), &["./img/logo.png"]);
        let outcome = install_against_output(&config).await.unwrap();
        assert_eq!(outcome.missed.len(), 1);
        assert_eq!(outcome.missed[0].url, "http://localhost/img/logo.png");
    }

    #[test]
    fn test_check_without_build_output() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), &["./index.html"]);
        let err = check_site(&config).unwrap_err();
        assert!(err.to_string().contains("lander build"));
    }
}
