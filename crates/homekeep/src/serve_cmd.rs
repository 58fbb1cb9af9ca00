use anyhow::{Context, Result};
use hk_web::{HttpServer, router};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::AppContext;

/// Run the HTTP server and, when configured, the pool poller until Ctrl-C.
pub(crate) async fn handle_serve(
    ctx: &AppContext,
    bind: Option<String>,
    port: Option<u16>,
    no_poller: bool,
) -> Result<()> {
    let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
    let port = port.unwrap_or(ctx.config.server.port);
    let shutdown = CancellationToken::new();

    let poller = if no_poller {
        info!("pool poller disabled by --no-poller");
        None
    } else {
        match ctx.build_poller()? {
            Some(poller) => Some(poller.spawn(shutdown.child_token())),
            None => {
                info!("pool.status_url not set; pool poller disabled");
                None
            }
        }
    };

    let app = router(ctx.app_state(), ctx.config.server.max_request_body_bytes);
    let server = match HttpServer::start(&bind, port, app, shutdown.clone()).await {
        Ok(server) => server,
        Err(error) => {
            if let Some(poller) = poller {
                poller.shutdown().await;
            }
            return Err(error);
        }
    };
    eprintln!("homekeep listening on http://{}", server.local_addr());

    let signal = tokio::signal::ctrl_c().await;
    info!("shutting down");
    shutdown.cancel();
    server.wait().await;

    if let Some(poller) = poller {
        let stats = poller.shutdown().await;
        info!(
            ticks = stats.ticks,
            successes = stats.successes,
            failures = stats.failures,
            "pool poller finished"
        );
    }

    if let Err(error) = &signal {
        warn!(error = %error, "shutdown signal listener failed");
    }
    signal.context("Failed to listen for Ctrl-C")
}
