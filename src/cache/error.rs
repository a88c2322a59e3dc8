//! Cache controller error types.

use super::WorkerState;
use thiserror::Error;

/// One precache manifest entry that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheMiss {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("precache failed for {} of {} assets", .failed.len(), .total)]
    PrecacheAssetFailure {
        failed: Vec<PrecacheMiss>,
        total: usize,
    },

    #[error("network fetch failed for `{url}`: {reason}")]
    NetworkFetchFailure { url: String, reason: String },

    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: WorkerState,
    },

    #[error("invalid url `{0}`")]
    InvalidUrl(String, #[source] url::ParseError),
}
