//! Live HTTP server.
//!
//! Pages are rendered on request from the sources on disk, so template and
//! content edits are visible on reload. Manifest changes need a restart.
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────────────┐
//!              │   tiny_http::Server  │
//!              └──────────┬───────────┘
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!     worker 0       worker 1  ...  worker N-1
//!          └───────► Site::respond ◄─────┘
//! ```

use crate::{config::SiteConfig, log, site::Site};
use anyhow::{Context, Result, anyhow};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread,
    time::Instant,
};
use tiny_http::{Header, Request, Response, Server};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `site` until Ctrl+C.
///
/// This function:
/// 1. Binds to the configured interface and port (with auto-retry on port conflict)
/// 2. Sets up Ctrl+C handler for graceful shutdown
/// 3. Spawns `serve.workers` request threads and waits for them
pub fn serve_site(site: Arc<Site>, config: &SiteConfig) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface `{}`", config.serve.interface))?;
    let workers = config.serve.workers.max(1);

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Every blocked worker needs its own unblock
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr} ({workers} workers)");

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let server = Arc::clone(&server);
            let site = Arc::clone(&site);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &site) {
                        log!("serve"; "request error: {e}");
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("server worker panicked"))?;
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
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
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(request: Request, site: &Site) -> Result<()> {
    let started = Instant::now();
    let method = request.method().as_str().to_owned();
    let url = request.url().to_owned();

    let reply = site.respond(&method, &url);
    let status = reply.status;

    let mut response = Response::from_data(reply.body).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response = response.with_header(header);
    }
    request.respond(response)?;

    log!("serve"; "{method} {url} {status} {}ms", started.elapsed().as_millis());
    Ok(())
}
