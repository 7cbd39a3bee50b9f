//! Registry of open feed sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vrtrack_runtime::Registry;

use super::{DataFeedUpdate, FeedSession};

/// Tracks every subscriber's [`FeedSession`] by id.
pub struct FeedHub {
    registry: Registry,
    capacity: usize,
    next_id: AtomicU64,
    sessions: RwLock<HashMap<u64, Arc<FeedSession>>>,
    shutdown: CancellationToken,
}

impl FeedHub {
    /// Hub whose sessions all stop when `shutdown` fires.
    pub fn new(registry: Registry, capacity: usize, shutdown: CancellationToken) -> Self {
        Self {
            registry,
            capacity,
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    /// Open a session for a new subscriber.
    pub async fn open(&self) -> (Arc<FeedSession>, mpsc::Receiver<Arc<DataFeedUpdate>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (session, rx) = FeedSession::new(id, self.registry.clone(), self.capacity, &self.shutdown);
        let _ = self.sessions.write().await.insert(id, Arc::clone(&session));
        debug!(session = id, "feed session opened");
        (session, rx)
    }

    /// Look up an open session.
    pub async fn get(&self, id: u64) -> Option<Arc<FeedSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Close and forget a session.
    pub async fn close(&self, id: u64) {
        if let Some(session) = self.sessions.write().await.remove(&id) {
            session.close();
            debug!(session = id, dropped = session.drop_count(), "feed session closed");
        }
    }

    /// Number of open sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vrtrack_runtime::{ConfigContext, MemoryConfigStore};

    async fn hub(shutdown: CancellationToken) -> FeedHub {
        let config = ConfigContext::load(
            Arc::new(MemoryConfigStore::default()),
            Duration::from_millis(1000),
            8,
        )
        .await
        .unwrap();
        FeedHub::new(Registry::new(config, 8), 4, shutdown)
    }

    #[tokio::test]
    async fn open_and_close() {
        let hub = hub(CancellationToken::new()).await;
        let (a, _rx_a) = hub.open().await;
        let (b, _rx_b) = hub.open().await;
        assert_ne!(a.id(), b.id());
        assert_eq!(hub.session_count().await, 2);

        hub.close(a.id()).await;
        assert!(a.is_closed());
        assert!(hub.get(a.id()).await.is_none());
        assert!(hub.get(b.id()).await.is_some());
        assert_eq!(hub.session_count().await, 1);
    }

    #[tokio::test]
    async fn shutdown_closes_sessions() {
        let shutdown = CancellationToken::new();
        let hub = hub(shutdown.clone()).await;
        let (session, _rx) = hub.open().await;
        shutdown.cancel();
        assert!(session.is_closed());
    }
}
