//! Content server and composition root.
//!
//! A lightweight HTTP front built on `tiny_http` that wires the engine
//! together:
//!
//! - `GET` resolves the pathname to a site file and serves it, rendering
//!   `.html` pages through template expansion and translation
//!   substitution (or raw with the editor client injected during an
//!   edit session)
//! - `PUT` saves new page content: backup, write, re-seed the sidecar
//!   dictionary, then kick off background translation
//! - Graceful shutdown on Ctrl+C, bind retry on port conflict
//!
//! Session handling and authentication live outside this crate; the
//! edit-session flag arrives as a cookie set by that outer layer. The
//! translation orchestrator runs detached on its own tokio runtime and
//! is never awaited by a request.

use crate::{
    backup::save_backup,
    config::SiteConfig,
    i18n::{self, Orchestrator},
    log,
    render::{EDITOR_SCRIPT_ROUTE, render_page},
    resolve::{PAGE_EXT, ResolveError, resolve_pathname},
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{Cursor, Read},
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Editor client (embedded at compile time)
const EDITOR_SCRIPT: &str = include_str!("embed/edit.js");

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the content server.
///
/// Blocks handling requests until Ctrl+C is received. Translation work
/// is spawned onto a dedicated runtime owned by this function, so a
/// hung backend can never stall request handling.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let orchestrator = Arc::new(Orchestrator::new(config, runtime.handle()));

    log!("serve"; "http://{addr}");
    log!("serve"; "site root: {}", config.site.root.display());

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config, &runtime, &orchestrator) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
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
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                // Last attempt failed
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Dispatch a single request.
fn handle_request(
    request: Request,
    config: &'static SiteConfig,
    runtime: &tokio::runtime::Runtime,
    orchestrator: &Arc<Orchestrator>,
) -> Result<()> {
    // Strip query string (e.g. ?t=123456) before resolving
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or(&url).to_string();

    match request.method() {
        Method::Get if path == EDITOR_SCRIPT_ROUTE => serve_editor_script(request),
        Method::Get => handle_get(request, config, &path),
        Method::Put => handle_save(request, config, runtime, orchestrator, &path),
        Method::Delete => handle_delete(request, config, &path),
        _ => serve_status(request, 405, "method not allowed"),
    }
}

/// Serve a resolved site file, rendering pages through the pipeline.
fn handle_get(request: Request, config: &'static SiteConfig, path: &str) -> Result<()> {
    let resolved = match resolve_pathname(&config.site.root, path, false) {
        Ok(resolved) => resolved,
        Err(err) => return serve_resolve_error(request, &err),
    };
    if !resolved.exists {
        return serve_status(request, 404, "404 Not Found");
    }

    if resolved.file.extension().is_some_and(|ext| ext == PAGE_EXT) {
        let content = fs::read_to_string(&resolved.file)
            .with_context(|| format!("Failed to read {}", resolved.file.display()))?;
        let lang = cookie_value(&request, "lang")
            .unwrap_or(&config.i18n.source)
            .to_string();
        let edit_mode = cookie_value(&request, "lingon_edit") == Some("1");

        match render_page(config, content, &resolved.file, &lang, edit_mode) {
            Ok(html) => serve_html(request, html),
            Err(err) => {
                log!("error"; "render failed for {}: {err}", resolved.file.display());
                serve_status(request, 500, "template expansion failed")
            }
        }
    } else {
        serve_file(request, &resolved.file)
    }
}

/// Persist edited page content: backup, write, re-seed the dictionary,
/// then spawn background translation. The response never waits for the
/// orchestrator.
fn handle_save(
    mut request: Request,
    config: &'static SiteConfig,
    runtime: &tokio::runtime::Runtime,
    orchestrator: &Arc<Orchestrator>,
    path: &str,
) -> Result<()> {
    let mut content = String::new();
    if let Err(err) = request.as_reader().read_to_string(&mut content) {
        log!("serve"; "unreadable request body: {err}");
        return serve_status(request, 400, "unreadable request body");
    }
    let content = content.trim().to_string();
    if content.is_empty() {
        return serve_status(request, 400, "empty content");
    }

    let resolved = match resolve_pathname(&config.site.root, path, true) {
        Ok(resolved) => resolved,
        Err(err) => return serve_resolve_error(request, &err),
    };
    let file = resolved.file;

    if config.backup.enable {
        if let Some(backup) = save_backup(&file)? {
            log!("backup"; "{}", backup.display());
        }
    }

    fs::write(&file, content.clone() + "\n")
        .with_context(|| format!("Failed to write {}", file.display()))?;
    log!("serve"; "saved {}", file.display());

    let translatable =
        config.i18n.enable && file.extension().is_some_and(|ext| ext == PAGE_EXT);
    if translatable {
        seed_sidecar(config, &file, &content);
    }

    serve_status(request, 200, "saved")?;

    if translatable {
        let orchestrator = Arc::clone(orchestrator);
        runtime.spawn(async move {
            orchestrator.fill_dictionary(&file).await;
        });
    }

    Ok(())
}

/// Remove a resolved site file.
///
/// With backups enabled the file is renamed aside instead of unlinked,
/// so a delete is as recoverable as an overwrite.
fn handle_delete(request: Request, config: &'static SiteConfig, path: &str) -> Result<()> {
    let resolved = match resolve_pathname(&config.site.root, path, false) {
        Ok(resolved) => resolved,
        Err(err) => return serve_resolve_error(request, &err),
    };
    if !resolved.exists {
        return serve_status(request, 404, "404 Not Found");
    }

    if config.backup.enable {
        if let Some(backup) = save_backup(&resolved.file)? {
            log!("backup"; "{}", backup.display());
        }
    } else {
        fs::remove_file(&resolved.file)
            .with_context(|| format!("Failed to remove {}", resolved.file.display()))?;
    }

    log!("serve"; "deleted {}", resolved.file.display());
    serve_status(request, 200, "deleted")
}

/// Add dictionary entries for wrapped spans new in this save.
fn seed_sidecar(config: &SiteConfig, file: &Path, content: &str) {
    let sidecar = i18n::lang_file_path(file);
    let mut dict = i18n::load_lang_file(&sidecar).unwrap_or_default();
    let changed = i18n::seed_dictionary(
        &mut dict,
        content,
        &config.i18n.languages,
        &config.i18n.source,
    );
    if changed && !dict.is_empty() {
        if let Err(err) = i18n::write_lang_file(&sidecar, &dict) {
            log!("i18n"; "failed to seed {}: {err}", sidecar.display());
        }
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Map resolution errors onto HTTP statuses.
fn serve_resolve_error(request: Request, err: &ResolveError) -> Result<()> {
    let status = match err {
        ResolveError::OutOfRoot | ResolveError::Forbidden => 403,
        ResolveError::UnsupportedType(_) => 400,
        ResolveError::Io(..) => 500,
    };
    serve_status(request, status, &err.to_string())
}

fn serve_editor_script(request: Request) -> Result<()> {
    let response = Response::from_string(EDITOR_SCRIPT).with_header(
        Header::from_bytes("Content-Type", "application/javascript; charset=utf-8").unwrap(),
    );
    request.respond(response)?;
    Ok(())
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path);

    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());

    request.respond(response)?;
    Ok(())
}

/// Serve HTML content.
fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve a plain-text status response.
fn serve_status(request: Request, status: u16, message: &str) -> Result<()> {
    let response = Response::new(
        StatusCode(status),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new(message.to_string()),
        Some(message.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Read a cookie set by the outer session layer.
fn cookie_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .filter(|header| header.field.equiv("Cookie"))
        .find_map(|header| {
            header.value.as_str().split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then_some(value)
            })
        })
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
