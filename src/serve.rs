//! Preview server for the build output.
//!
//! A lightweight HTTP server built on `tiny_http`:
//!
//! - Static file serving from the build output directory
//! - Automatic `index.html` resolution for directories
//! - A contact endpoint stand-in (see [`crate::contact`])
//! - Graceful shutdown on Ctrl+C
//!
//! ```text
//! request ──► contact endpoint?  ──yes──► ContactEndpoint::submit ──► JSON / HTML
//!                    │
//!                    no
//!                    ▼
//!             file under output ──► 200 with guessed content type
//!                    │
//!                    ▼
//!                   404
//! ```

use crate::{
    config::SiteConfig,
    contact::{ContactEndpoint, Outcome, Reply, wants_json},
    log,
    utils::mime::guess_content_type,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::{Cursor, Read},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Start the preview server. Blocks until Ctrl+C is received.
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);
    log!("contact"; "POST http://{}{} (mail is not sent)", addr, config.serve.contact_endpoint);

    let site = Site {
        root: config.output_dir(),
        contact_endpoint: config.serve.contact_endpoint.clone(),
        contact: ContactEndpoint::default(),
    };

    for request in server.incoming_requests() {
        if let Err(e) = site.handle(request) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map_or_else(|| "no attempt made".to_owned(), |e| e.to_string())
    ))
}

/// Everything a request handler needs.
struct Site {
    root: PathBuf,
    contact_endpoint: String,
    contact: ContactEndpoint,
}

impl Site {
    /// Handle a single HTTP request.
    fn handle(&self, mut request: Request) -> Result<()> {
        let url_path = request_path(request.url());

        if url_path == self.contact_endpoint {
            let reply = self.submit_contact(&mut request);
            log!("contact"; "{} {} → {}", request.method(), url_path, reply.status);
            return respond(request, reply.status, reply.content_type, reply.body.into_bytes());
        }

        match resolve_file(&self.root, &url_path) {
            Some(path) => serve_file(request, &path),
            None => serve_not_found(request),
        }
    }

    fn submit_contact(&self, request: &mut Request) -> Reply {
        let header = |name: &'static str| {
            request
                .headers()
                .iter()
                .find(|h| h.field.equiv(name))
                .map(|h| h.value.as_str().to_owned())
        };
        let json = wants_json(header("Accept").as_deref(), header("X-Requested-With").as_deref());

        let method = request.method().as_str().to_owned();
        let addr = request
            .remote_addr()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SocketAddr::ip);

        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            log!("contact"; "failed to read body: {e}");
            return Outcome::Failed.reply(json);
        }

        self.contact.submit(&method, addr, &body).reply(json)
    }
}

/// Decoded URL path without the query string.
fn request_path(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    urlencoding::decode(without_query)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| without_query.to_owned())
}

/// Map a URL path to an existing file under `root`, resolving directories
/// to their `index.html`. Parent and root components are dropped.
fn resolve_file(root: &Path, url_path: &str) -> Option<PathBuf> {
    let rel: PathBuf = Path::new(url_path.trim_matches('/'))
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let local = root.join(rel);

    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    index.is_file().then_some(index)
}

fn respond(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let header = Header::from_bytes("Content-Type", content_type)
        .map_err(|_| anyhow!("invalid content type `{content_type}`"))?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response)?;
    Ok(())
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    respond(request, 200, guess_content_type(path), content)
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let header = Header::from_bytes("Content-Type", "text/plain")
        .map_err(|_| anyhow!("invalid content type"))?;
    let response = Response::new(
        StatusCode(404),
        vec![header],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}
