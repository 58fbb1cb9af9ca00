use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::Router;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A running axum listener that stops when its token is cancelled.
#[derive(Debug)]
pub struct HttpServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    server_task: JoinHandle<()>,
}

impl HttpServer {
    /// Bind `bind:port` and serve `app` on a background task.
    ///
    /// `bind` is an IPv4 or IPv6 address; IPv6 may be written with or without
    /// brackets.
    ///
    /// `shutdown` is shared with the rest of the process; cancelling it drains
    /// in-flight requests and stops accepting new ones.
    pub async fn start(
        bind: &str,
        port: u16,
        app: Router,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let host = bind
            .strip_prefix('[')
            .and_then(|b| b.strip_suffix(']'))
            .unwrap_or(bind);
        let ip = host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid HTTP bind address '{bind}'"))?;
        let bind_addr = SocketAddr::new(ip, port);

        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind HTTP endpoint at {bind_addr}"))?;
        let addr = listener
            .local_addr()
            .context("failed to resolve local HTTP address")?;

        let server_shutdown = shutdown.clone();
        let server_task = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                })
                .await
            {
                warn!(error = %error, "HTTP server stopped with error");
            }
        });

        info!(addr = %addr, "HTTP server listening");
        Ok(Self {
            addr,
            shutdown,
            server_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Resolves once the server task has exited.
    pub async fn wait(self) {
        if let Err(error) = self.server_task.await {
            debug!(error = %error, "HTTP server join failed");
        }
    }

    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.wait().await;
    }
}
