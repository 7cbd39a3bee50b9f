//! One subscriber's datafeed timers and outbound queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vrtrack_runtime::Registry;

use super::{DataFeedConfig, DataFeedUpdate, DataMask, build_update};

/// A subscriber's feed: zero or more periodic configs and a bounded queue.
///
/// A full queue drops the update instead of blocking the timers.
pub struct FeedSession {
    id: u64,
    registry: Registry,
    tx: mpsc::Sender<Arc<DataFeedUpdate>>,
    dropped: AtomicU64,
    cancel: CancellationToken,
    timers: Mutex<Option<CancellationToken>>,
}

impl FeedSession {
    /// Create a session and the receiver its updates arrive on.
    ///
    /// The session stops when `parent` is cancelled.
    pub fn new(
        id: u64,
        registry: Registry,
        capacity: usize,
        parent: &CancellationToken,
    ) -> (Arc<Self>, mpsc::Receiver<Arc<DataFeedUpdate>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let session = Arc::new(Self {
            id,
            registry,
            tx,
            dropped: AtomicU64::new(0),
            cancel: parent.child_token(),
            timers: Mutex::new(None),
        });
        (session, rx)
    }

    /// Session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Replace every running timer with one per config.
    pub fn start_data_feed(self: &Arc<Self>, configs: &[DataFeedConfig]) {
        let timers = self.cancel.child_token();
        if let Some(previous) = self.timers.lock().replace(timers.clone()) {
            previous.cancel();
        }

        for config in configs {
            drop(tokio::spawn(run_timer(Arc::clone(self), *config, timers.clone())));
        }
        debug!(session = self.id, feeds = configs.len(), "datafeed started");
    }

    /// Publish one update right now.
    pub fn poll_data_feed(&self, mask: &DataMask) -> bool {
        self.publish(mask)
    }

    fn publish(&self, mask: &DataMask) -> bool {
        let update = build_update(&self.registry.state(), mask);
        match self.tx.try_send(Arc::new(update)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(session = self.id, dropped, "subscriber queue full, dropping datafeed update");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(session = self.id, "subscriber gone, stopping datafeed");
                self.close();
                false
            }
        }
    }

    /// Updates dropped because the subscriber was slow.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop all timers.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn run_timer(session: Arc<FeedSession>, config: DataFeedConfig, cancel: CancellationToken) {
    let period = config.minimum_time_since_last.max(std::time::Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let _ = session.publish(&config.data_mask);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vrtrack_core::Origin;
    use vrtrack_runtime::{ConfigContext, MemoryConfigStore};

    async fn registry() -> Registry {
        let config = ConfigContext::load(
            Arc::new(MemoryConfigStore::default()),
            Duration::from_millis(1000),
            8,
        )
        .await
        .unwrap();
        let registry = Registry::new(config, 8);
        let _ = registry.create_device("aa", Origin::Udp).await.unwrap();
        registry
    }

    fn every(ms: u64, device_data: bool) -> DataFeedConfig {
        DataFeedConfig {
            minimum_time_since_last: Duration::from_millis(ms),
            data_mask: DataMask {
                device_data,
                tracker_data: None,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn independent_timers_fire_at_their_own_period() {
        let root = CancellationToken::new();
        let (session, mut rx) = FeedSession::new(1, registry().await, 64, &root);
        session.start_data_feed(&[every(100, true), every(250, false)]);

        tokio::time::sleep(Duration::from_millis(510)).await;
        let mut with_devices = 0;
        let mut empty = 0;
        while let Ok(update) = rx.try_recv() {
            if update.devices.is_empty() {
                empty += 1;
            } else {
                with_devices += 1;
            }
        }
        assert_eq!(with_devices, 5);
        assert_eq!(empty, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_timers() {
        let root = CancellationToken::new();
        let (session, mut rx) = FeedSession::new(1, registry().await, 64, &root);
        session.start_data_feed(&[every(100, true)]);
        session.start_data_feed(&[every(1000, true)]);

        tokio::time::sleep(Duration::from_millis(950)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn poll_publishes_immediately() {
        let root = CancellationToken::new();
        let (session, mut rx) = FeedSession::new(1, registry().await, 4, &root);
        assert!(session.poll_data_feed(&DataMask {
            device_data: true,
            tracker_data: None,
        }));
        let update = rx.recv().await.unwrap();
        assert_eq!(update.devices.len(), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_and_counts() {
        let root = CancellationToken::new();
        let (session, _rx) = FeedSession::new(1, registry().await, 1, &root);
        let mask = DataMask::default();
        assert!(session.poll_data_feed(&mask));
        assert!(!session.poll_data_feed(&mask));
        assert!(!session.poll_data_feed(&mask));
        assert_eq!(session.drop_count(), 2);
        assert!(!session.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancel_stops_timers() {
        let root = CancellationToken::new();
        let (session, mut rx) = FeedSession::new(1, registry().await, 64, &root);
        session.start_data_feed(&[every(100, true)]);
        root.cancel();
        assert!(session.is_closed());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
