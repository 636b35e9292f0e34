//! Periodic dashboard refresh
//!
//! Runs as an independent task that refetches on a fixed interval. The first
//! refresh happens immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::TaskManager;

pub struct DashboardRefresher {
    handle: JoinHandle<()>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl DashboardRefresher {
    /// Spawn the refresh loop on the current runtime
    pub fn spawn(manager: Arc<TaskManager>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Dashboard refresh every {:?}", period);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if manager.is_closed() {
                            break;
                        }
                        manager.refresh().await;
                    }
                }
            }
            debug!("Dashboard refresh stopped");
        });

        Self {
            handle,
            stop_tx: Some(stop_tx),
        }
    }

    /// Stop the loop and wait for it to exit
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DashboardRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use crate::testing::FakeTaskStore;

    #[tokio::test]
    async fn test_refreshes_on_interval() {
        let store = Arc::new(FakeTaskStore::with_tasks(vec![Task::new(1, "a")]));
        let manager = Arc::new(TaskManager::new(store.clone()));

        let refresher = DashboardRefresher::spawn(Arc::clone(&manager), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(110)).await;
        refresher.stop().await;

        let calls = store.list_all_calls();
        assert!(calls >= 2, "expected repeated refreshes, got {}", calls);
        assert_eq!(manager.stats().total, 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.list_all_calls(), calls);
    }

    #[tokio::test]
    async fn test_exits_when_manager_closed() {
        let store = Arc::new(FakeTaskStore::new());
        let manager = Arc::new(TaskManager::new(store.clone()));
        manager.close();

        let refresher = DashboardRefresher::spawn(manager, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(refresher.is_finished());
        assert_eq!(store.list_all_calls(), 0);
    }

    #[tokio::test]
    async fn test_drop_mid_fetch_leaves_manager_usable() {
        let store = Arc::new(FakeTaskStore::with_tasks(vec![Task::new(1, "a")]));
        let gate = store.hold_reads();
        let manager = Arc::new(TaskManager::new(store.clone()));

        let refresher = DashboardRefresher::spawn(Arc::clone(&manager), Duration::from_secs(60));
        let mut updates = manager.subscribe();
        updates.wait_for(|state| state.is_loading()).await.unwrap();

        drop(refresher);
        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|state| !state.is_loading()),
        )
        .await
        .unwrap()
        .unwrap();

        gate.release();
        assert!(manager.refresh().await);
        assert!(!manager.is_loading());
        assert!(manager.state().is_ready());
        assert_eq!(manager.pending().len(), 1);
    }
}
