//! Live server rendering pages from memory.
//!
//! Built on `tiny_http`:
//!
//! - Every [`Route`] rendered on request from the current [`SiteContext`]
//! - `/favicon.ico` from the data directory, `/static/*` from the static directory
//! - Context hot-swapped by the watcher thread (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    load() snapshot         rebuild context
//!    render route            store() on success
//!          │                       │
//!          └──── ArcSwap<SiteContext> ────┘
//! ```

use crate::{
    context::SiteContext,
    log,
    render::{Route, render},
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use arc_swap::ArcSwap;
use std::{
    fs,
    io::ErrorKind,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    thread,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `site` until Ctrl+C.
///
/// Binds with port auto-retry, spawns the watcher when `[serve] watch` is
/// set, then answers requests on this thread from whatever context is current.
pub fn serve_site(site: SiteContext) -> Result<()> {
    let serve = &site.config().serve;
    let interface: IpAddr = serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, serve.port, MAX_PORT_RETRIES)?;
    let watch = serve.watch;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    let current = Arc::new(ArcSwap::from_pointee(site));

    if watch {
        let current = Arc::clone(&current);
        thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(&current) {
                log!("watch"; "{err:#}");
            }
        });
    }

    for request in server.incoming_requests() {
        let site = current.load();
        if let Err(e) = handle_request(request, &site) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;

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
            Err(e) => last_err = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// What to send back, independent of the HTTP library.
#[derive(Debug, PartialEq, Eq)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    location: Option<&'static str>,
}

impl Reply {
    fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
            location: None,
        }
    }

    fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: message.into().into_bytes(),
            location: None,
        }
    }

    fn redirect(location: &'static str) -> Self {
        Self {
            status: 302,
            content_type: "text/plain; charset=utf-8",
            body: Vec::new(),
            location: Some(location),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }
}

fn handle_request(request: Request, site: &SiteContext) -> Result<()> {
    let debug = site.config().serve.debug;
    let reply = respond(site, request.method(), request.url());

    if debug {
        log!("serve"; "{} {} {}", request.method(), request.url(), reply.status);
    }

    let header = |name: &str, value: &str| {
        Header::from_bytes(name, value).map_err(|()| anyhow!("invalid header {name}: {value}"))
    };

    let mut response = Response::from_data(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(header("Content-Type", reply.content_type)?);
    if let Some(location) = reply.location {
        response = response.with_header(header("Location", location)?);
    }

    request.respond(response)?;
    Ok(())
}

/// Resolve one request against `site`.
///
/// Resolution order:
/// 1. Non-GET/HEAD → 405
/// 2. `/` → redirect to `/index.html`
/// 3. `/favicon.ico`, `/static/*` → file from disk
/// 4. Known route → rendered page
/// 5. Anything else → 404
fn respond(site: &SiteContext, method: &Method, url: &str) -> Reply {
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::text(405, "405 Method Not Allowed");
    }

    // Strip query string (e.g., ?t=123456) before decoding
    let raw_path = url.split(['?', '#']).next().unwrap_or(url);
    let Ok(path) = urlencoding::decode(raw_path) else {
        return Reply::not_found();
    };
    let path = path.trim_start_matches('/');

    let config = site.config();
    if path.is_empty() {
        return Reply::redirect("/index.html");
    }
    if path == "favicon.ico" {
        return serve_file(&config.site.data_path.join("favicon.ico"));
    }
    if let Some(rest) = path.strip_prefix("static/") {
        return match safe_join(&config.site.static_dir, rest) {
            Some(file) => serve_file(&file),
            None => Reply::not_found(),
        };
    }

    let Some(route) = Route::parse(path) else {
        return Reply::not_found();
    };

    match render(site, &route) {
        Ok(page) => Reply::ok(page.kind.content_type(), page.body),
        Err(err) if err.is_not_found() => Reply::not_found(),
        Err(err) => {
            let err = anyhow::Error::new(err);
            log!("error"; "{route}: {err:#}");
            if config.serve.debug {
                Reply::text(500, format!("500 Internal Server Error\n\n{err:?}"))
            } else {
                Reply::text(500, "500 Internal Server Error")
            }
        }
    }
}

/// `base/rel`, unless `rel` tries to leave `base`.
fn safe_join(base: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    rel.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| base.join(rel))
}

fn serve_file(path: &Path) -> Reply {
    match fs::read(path) {
        Ok(content) => Reply::ok(guess_content_type(path), content),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
            Reply::not_found()
        }
        Err(e) => {
            log!("error"; "{}: {e}", path.display());
            Reply::text(500, "500 Internal Server Error")
        }
    }
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("map") => "application/json",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}
