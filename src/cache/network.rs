//! The network behind the cache.

use super::{
    CacheError,
    request::{Request, Response, ResponseType},
};
use crate::utils::mime::guess_content_type;
use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use url::Url;

/// Something that can answer requests the cache misses.
///
/// A failed fetch (unreachable host, offline) is an `Err`; an HTTP error
/// status is still an `Ok` response whose `ok()` is false.
pub trait Network: Send + Sync + 'static {
    fn fetch(&self, request: &Request)
    -> impl Future<Output = Result<Response, CacheError>> + Send;
}

/// Serves a built output directory as if it were deployed at `origin`.
///
/// Cross-origin requests fail like an unreachable host would.
#[derive(Debug, Clone)]
pub struct DirectoryNetwork {
    root: PathBuf,
    origin: Url,
}

impl DirectoryNetwork {
    pub fn new(root: &Path, origin: Url) -> Self {
        Self {
            root: root.to_path_buf(),
            origin,
        }
    }

    /// Map a URL path onto a file below `root`. `/` and directories map to `index.html`.
    fn local_path(&self, url: &Url) -> PathBuf {
        let decoded = urlencoding::decode(url.path())
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_else(|_| url.path().to_owned());
        let rel = decoded.trim_matches('/');

        // Never walk above the served root
        let path = self.root.join(
            Path::new(rel)
                .components()
                .filter(|c| matches!(c, std::path::Component::Normal(_)))
                .collect::<PathBuf>(),
        );
        if path.is_dir() {
            path.join("index.html")
        } else {
            path
        }
    }
}

impl Network for DirectoryNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, CacheError> {
        if request.url.origin() != self.origin.origin() {
            return Err(CacheError::NetworkFetchFailure {
                url: request.url.to_string(),
                reason: "host not served by this directory".into(),
            });
        }

        let path = self.local_path(&request.url);
        let read_path = path.clone();
        let content = tokio::task::spawn_blocking(move || std::fs::read(read_path))
            .await
            .map_err(|err| CacheError::NetworkFetchFailure {
                url: request.url.to_string(),
                reason: err.to_string(),
            })?;

        let response = match content {
            Ok(body) => Response::new(200, body)
                .with_header("Content-Type", guess_content_type(&path)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Response::new(404, b"404 Not Found".as_slice())
                    .with_header("Content-Type", "text/plain")
            }
            Err(err) => Response::new(500, err.to_string().into_bytes())
                .with_header("Content-Type", "text/plain"),
        };
        Ok(response.with_kind(ResponseType::Basic))
    }
}
