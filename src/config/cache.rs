//! `[cache]` section configuration.
//!
//! Settings for the runtime cache controller: bucket versioning, the
//! precache manifest and the request shapes each strategy applies to.

use super::defaults;
use crate::cache::Destination;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[cache]` section in lander.toml.
///
/// Bumping `version` is the only way entries leave the cache: the next
/// activation deletes every bucket that does not carry the new name.
///
/// # Example
/// ```toml
/// [cache]
/// version = "v1.2.0"
/// scope = "https://example.com/"
/// precache = ["./index.html", "./css/styles.css"]
/// revalidate_prefix = "/partials/"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Release version embedded in the bucket name.
    #[serde(default = "defaults::cache::version")]
    #[educe(Default = defaults::cache::version())]
    pub version: String,

    /// Bucket name prefix, joined directly with `version`.
    #[serde(default = "defaults::cache::prefix")]
    #[educe(Default = defaults::cache::prefix())]
    pub prefix: String,

    /// Absolute URL the worker is registered under.
    /// Its origin decides which requests count as same-origin.
    #[serde(default = "defaults::cache::scope")]
    #[educe(Default = defaults::cache::scope())]
    pub scope: String,

    /// Paths relative to `scope`, fetched and stored on install.
    #[serde(default = "defaults::cache::precache")]
    #[educe(Default = defaults::cache::precache())]
    pub precache: Vec<String>,

    /// Document served for navigations when the network is unreachable.
    #[serde(default = "defaults::cache::fallback")]
    #[educe(Default = defaults::cache::fallback())]
    pub fallback: String,

    /// URL path prefix served stale-while-revalidate.
    #[serde(default = "defaults::cache::revalidate_prefix")]
    #[educe(Default = defaults::cache::revalidate_prefix())]
    pub revalidate_prefix: String,

    /// Request destinations served cache-first.
    #[serde(default = "defaults::cache::destinations")]
    #[educe(Default = defaults::cache::destinations())]
    pub destinations: Vec<Destination>,
}

impl CacheConfig {
    /// Name of the bucket owned by this version.
    pub fn bucket_name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use crate::cache::Destination;

    #[test]
    fn test_cache_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.cache.bucket_name(), "static-v1.1.0");
        assert_eq!(config.cache.precache.first().map(String::as_str), Some("./index.html"));
        assert_eq!(config.cache.revalidate_prefix, "/partials/");
        assert_eq!(config.cache.destinations.len(), 4);
    }

    #[test]
    fn test_cache_config_custom() {
        let config: SiteConfig = toml::from_str(
            r#"
            [cache]
            version = "v2.0.0"
            prefix = "site-"
            precache = ["./index.html"]
            revalidate_prefix = "/fragments/"
            destinations = ["style", "font"]
        "#,
        )
        .unwrap();

        assert_eq!(config.cache.bucket_name(), "site-v2.0.0");
        assert_eq!(config.cache.precache, vec!["./index.html".to_string()]);
        assert_eq!(config.cache.revalidate_prefix, "/fragments/");
        assert_eq!(
            config.cache.destinations,
            vec![Destination::Style, Destination::Font]
        );
    }

    #[test]
    fn test_unknown_destination_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [cache]
            destinations = ["stylesheet"]
        "#,
        );
        assert!(result.is_err());
    }
}
