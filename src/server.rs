//! Minimal "Hello, World!" HTTP server
//!
//! Answers `GET /` with a fixed text body and everything else with 404.
//! Requests are read with a single read and closed after one response.

use std::future::Future;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::errors::{ChunkpostError, Result};

pub const HELLO_BODY: &str = "Hello, World!";

/// A bound listener ready to serve
pub struct HelloServer {
    listener: TcpListener,
}

impl HelloServer {
    /// Bind `host:port`. Port 0 picks a free port.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::AddrInUse {
                warn!(addr = %addr, "Port is already in use");
            }
            ChunkpostError::Bind { addr, source }
        })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!("Server is running on http://{}", addr);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutting down server");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer).await {
                                warn!(peer = %peer, error = %e, "Connection error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Accept error"),
                },
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&buf[..n]);
    let (method, path) = parse_request_line(&request)
        .ok_or_else(|| ChunkpostError::Argument("Invalid request line".to_string()))?;

    let (status, body) = route(method, path);
    info!(method, path, peer = %peer, status, "Request received");

    stream.write_all(render_response(status, body).as_bytes()).await?;
    stream.flush().await?;
    debug!(peer = %peer, "Response sent");
    Ok(())
}

/// `(method, path)` from the first request line; the query string is dropped
fn parse_request_line(request: &str) -> Option<(&str, &str)> {
    let mut parts = request.lines().next()?.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let path = target.split_once('?').map_or(target, |(p, _)| p);
    Some((method, path))
}

fn route(method: &str, path: &str) -> (u16, &'static str) {
    match (method, path) {
        ("GET", "/") => (200, HELLO_BODY),
        _ => (404, "Not Found"),
    }
}

fn render_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Unknown",
    };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    )
}
