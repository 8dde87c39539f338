use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::telemetry::Metrics;

use super::guards::ConnectionGuard;

/// Errors that can occur when trying to accept a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Server is shutting down")]
    Shutdown,
    #[error("Connection limit exceeded (current: {current}, limit: {limit})")]
    LimitExceeded { current: usize, limit: usize },
}

/// Manages connection limits and lifecycle
pub struct ConnectionManager {
    active_connections: Arc<AtomicUsize>,
    max_connections: usize,
    shutdown: CancellationToken,
    connections_closed_tx: watch::Sender<()>,
}

impl ConnectionManager {
    pub fn new(max_connections: usize, shutdown: CancellationToken) -> Self {
        let (connections_closed_tx, _) = watch::channel(());
        Self {
            active_connections: Arc::new(AtomicUsize::new(0)),
            max_connections,
            shutdown,
            connections_closed_tx,
        }
    }

    pub fn active(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Receiver notified each time the active count drops to zero
    pub fn subscribe_closed(&self) -> watch::Receiver<()> {
        self.connections_closed_tx.subscribe()
    }

    /// Try to accept a new connection
    /// Returns Ok(guard) if connection is accepted, Err(ConnectionError) if rejected
    pub fn try_accept(
        &self,
        peer: SocketAddr,
        metrics: Option<&Arc<Metrics>>,
    ) -> Result<ConnectionGuard, ConnectionError> {
        if self.is_shutdown() {
            return Err(ConnectionError::Shutdown);
        }

        let current_connections = self.active_connections.load(Ordering::Acquire);
        if current_connections >= self.max_connections {
            if let Some(m) = metrics {
                m.connections_rejected_total.add(1, &[]);
            }
            warn!(
                current = current_connections,
                limit = self.max_connections,
                peer = %peer,
                "Connection limit exceeded, rejecting connection"
            );
            return Err(ConnectionError::LimitExceeded {
                current: current_connections,
                limit: self.max_connections,
            });
        }

        self.active_connections.fetch_add(1, Ordering::AcqRel);

        if let Some(m) = metrics {
            m.connections_total.add(1, &[]);
            m.connections_active.add(1, &[]);
        }

        Ok(ConnectionGuard::new(
            self.active_connections.clone(),
            self.connections_closed_tx.clone(),
            metrics.map(|m| m.connections_active.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    #[test]
    fn rejects_beyond_limit_and_releases_on_drop() {
        let manager = ConnectionManager::new(1, CancellationToken::new());
        let first = manager.try_accept(peer(), None);
        assert!(first.is_ok());
        assert!(matches!(
            manager.try_accept(peer(), None),
            Err(ConnectionError::LimitExceeded { current: 1, limit: 1 })
        ));
        drop(first);
        assert_eq!(manager.active(), 0);
        assert!(manager.try_accept(peer(), None).is_ok());
    }

    #[test]
    fn rejects_after_shutdown() {
        let shutdown = CancellationToken::new();
        let manager = ConnectionManager::new(4, shutdown.clone());
        shutdown.cancel();
        assert!(matches!(manager.try_accept(peer(), None), Err(ConnectionError::Shutdown)));
    }
}
