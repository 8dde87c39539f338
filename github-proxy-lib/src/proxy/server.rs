use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::connection::{ConnectionError, ConnectionGuard, ConnectionManager};
use crate::proxy::context::ProxyContext;
use crate::proxy::handler::handle_request;

/// Connection ceiling and shutdown grace period for the proxy listener
#[derive(Debug, Clone, Copy)]
pub struct ServerLimits {
    pub max_connections: usize,
    pub shutdown_timeout: Duration,
}

impl ServerLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_connections: config.security.max_connections,
            shutdown_timeout: config.timeout.shutdown(),
        }
    }
}

/// Bind `config.listen` and serve until `ctx.shutdown` is cancelled.
pub async fn run(config: &Config, ctx: ProxyContext) -> Result<()> {
    let addr = config.listen;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        ProxyError::Io(std::io::Error::new(e.kind(), format!("failed to bind {addr}: {e}")))
    })?;
    serve(listener, ctx, ServerLimits::from_config(config)).await
}

/// Accept connections on `listener` until shutdown, then wait up to
/// `limits.shutdown_timeout` for in-flight connections to finish.
pub async fn serve(listener: TcpListener, ctx: ProxyContext, limits: ServerLimits) -> Result<()> {
    let addr = listener.local_addr()?;
    let builder = ConnBuilder::new(TokioExecutor::new());
    let manager = Arc::new(ConnectionManager::new(limits.max_connections, ctx.shutdown.clone()));
    let mut connections_closed = manager.subscribe_closed();

    info!(%addr, max_connections = limits.max_connections, "starting github proxy (h1/h2)");

    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                info!("shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                let guard = match manager.try_accept(peer, ctx.metrics.as_ref()) {
                    Ok(guard) => guard,
                    Err(ConnectionError::Shutdown) => {
                        debug!(%peer, "shutdown in progress, dropping connection");
                        continue;
                    }
                    Err(ConnectionError::LimitExceeded { .. }) => continue,
                };

                tokio::spawn(serve_connection(builder.clone(), stream, peer, ctx.clone(), guard));
            }
        }
    }

    drop(listener);
    wait_for_connections(&manager, &mut connections_closed, limits.shutdown_timeout).await;
    info!("proxy server stopped");
    Ok(())
}

async fn serve_connection(
    builder: ConnBuilder<TokioExecutor>,
    stream: TcpStream,
    peer: SocketAddr,
    ctx: ProxyContext,
    _guard: ConnectionGuard,
) {
    let shutdown = ctx.shutdown.clone();
    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
        let ctx = ctx.clone();
        // Only GETs are served, so the body is never read.
        let (parts, _body) = req.into_parts();
        let req = Request::from_parts(parts, ());
        async move { Ok::<_, hyper::Error>(handle_request(&req, peer, &ctx).await) }
    });

    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let result = tokio::select! {
        res = conn.as_mut() => res,
        _ = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };
    if let Err(e) = result {
        debug!(%peer, error = %e, "serve_connection error");
    }
}

async fn wait_for_connections(
    manager: &ConnectionManager,
    connections_closed: &mut tokio::sync::watch::Receiver<()>,
    timeout: Duration,
) {
    let active = manager.active();
    if active == 0 {
        info!("all connections closed");
        return;
    }
    info!(active_connections = active, timeout_secs = timeout.as_secs(), "waiting for active connections to finish");

    let drained = tokio::time::timeout(timeout, async {
        while manager.active() > 0 {
            if connections_closed.changed().await.is_err() {
                break;
            }
        }
    })
    .await;

    match drained {
        Ok(()) => info!("all connections closed"),
        Err(_) => warn!(
            active_connections = manager.active(),
            "shutdown timeout reached, abandoning remaining connections"
        ),
    }
}
