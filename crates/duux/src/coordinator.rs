//! Device state snapshots and the coordinator that owns them.
//!
//! Entities never fetch or mutate state themselves. They read the latest
//! snapshot from a [`Coordinator`] and ask it to refresh after sending a
//! command. Scheduling periodic polls is left to whoever drives the
//! coordinator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use tracing::warn;

use crate::api::ApiError;
use crate::api::ApiResult;

/// Latest reported state of one heater (`temp`, `sp`, `power`, `mode`,
/// `heatin`, optionally `availableModes`, ...).
pub type Snapshot = Map<String, Value>;

pub type SnapshotReceiver = watch::Receiver<Option<Arc<Snapshot>>>;

#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Most recent snapshot, if one has been fetched.
    fn snapshot(&self) -> Option<Arc<Snapshot>>;

    /// Whether the most recent refresh succeeded.
    fn last_update_success(&self) -> bool;

    /// Refresh the snapshot. Returns once the attempt has finished; failures
    /// are recorded in [`Coordinator::last_update_success`].
    async fn request_refresh(&self);

    /// Change notifications for the snapshot.
    fn subscribe(&self) -> SnapshotReceiver;
}

/// Where a coordinator gets its snapshots from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, address: &str) -> ApiResult<Snapshot>;
}

/// Coordinator for a single device, backed by a watch channel.
pub struct WatchCoordinator {
    address: String,
    source: Arc<dyn SnapshotSource>,
    tx: watch::Sender<Option<Arc<Snapshot>>>,
    last_update_success: AtomicBool,
}

impl WatchCoordinator {
    pub fn new(address: impl Into<String>, source: Arc<dyn SnapshotSource>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            address: address.into(),
            source,
            tx,
            last_update_success: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Store a new snapshot and notify subscribers.
    pub fn publish(&self, snapshot: Snapshot) {
        self.last_update_success.store(true, Ordering::Release);
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Record a failed update. The previous snapshot stays readable.
    pub fn mark_failed(&self) {
        self.last_update_success.store(false, Ordering::Release);
    }

    /// Fetch from the source and publish the result.
    pub async fn refresh(&self) -> ApiResult<()> {
        match self.source.fetch(&self.address).await {
            Ok(snapshot) => {
                debug!("[{}] Snapshot refreshed", self.address);
                self.publish(snapshot);
                Ok(())
            }
            Err(e) => {
                self.mark_failed();
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Coordinator for WatchCoordinator {
    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.tx.borrow().clone()
    }

    fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Acquire)
    }

    async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!("[{}] Refresh failed: {}", self.address, e);
        }
    }

    fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }
}

/// Serves snapshots from a fixed map, keyed by device address.
#[derive(Debug, Default)]
pub struct FixedSource {
    snapshots: HashMap<String, Snapshot>,
}

impl FixedSource {
    pub fn new(snapshots: HashMap<String, Snapshot>) -> Self {
        Self { snapshots }
    }
}

#[async_trait]
impl SnapshotSource for FixedSource {
    async fn fetch(&self, address: &str) -> ApiResult<Snapshot> {
        self.snapshots
            .get(address)
            .cloned()
            .ok_or_else(|| ApiError::Request {
                address: address.to_string(),
                message: "no snapshot available".to_string(),
            })
    }
}
