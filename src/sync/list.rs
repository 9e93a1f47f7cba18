// SPDX-License-Identifier: MIT
//! Derived-list owner: in-memory store plus the synchronizer task.
//!
//! The store applies incremental events idempotently; the synchronizer task
//! corrects drift from missed events with a periodic full refetch and a
//! focus-regain refetch. The bus alone is never trusted for consistency.

use crate::sync::bus::{ListItem, SyncBus, SyncEvent};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};

/// Source of truth for full refetches.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    async fn fetch_all(&self) -> anyhow::Result<Vec<ListItem>>;
}

/// Options for [`run_synchronizer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Fixed drift-correction interval.
    ///
    /// Default: 30 s
    pub refresh_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
        }
    }
}

/// In-memory list kept in sync by events and refetches.
///
/// All mutation paths are idempotent, so replayed or duplicated events leave
/// the list unchanged.
#[derive(Debug, Default)]
pub struct DerivedList {
    items: RwLock<Vec<ListItem>>,
}

impl DerivedList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item unless one with the same id is already present.
    /// Returns `true` if the list changed.
    pub async fn insert(&self, item: ListItem) -> bool {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        items.push(item);
        true
    }

    /// Remove the item with the given id. No-op if absent.
    /// Returns `true` if the list changed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        items.len() != before
    }

    /// Replace the whole list (full-refetch path).
    pub async fn replace(&self, new_items: Vec<ListItem>) {
        *self.items.write().await = new_items;
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.items.read().await.iter().any(|item| item.id == id)
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Current contents, cloned for the renderer.
    pub async fn snapshot(&self) -> Vec<ListItem> {
        self.items.read().await.clone()
    }
}

async fn refresh(list: &DerivedList, fetcher: &dyn ListFetcher) {
    match fetcher.fetch_all().await {
        Ok(items) => {
            debug!(count = items.len(), "derived list refreshed");
            list.replace(items).await;
        }
        Err(e) => {
            // Keep the stale list; the next interval tick tries again.
            warn!(err = %e, "list refetch failed — keeping current contents");
        }
    }
}

/// Background task owning the derived list's consistency.
///
/// Performs an initial full fetch, then loops over three wakeup sources:
/// bus events (applied incrementally; `Refresh` and lagged receivers trigger
/// a full refetch), the fixed interval, and the focus-regain signal. Returns
/// when every [`SyncBus`] handle has been dropped.
pub async fn run_synchronizer(
    list: Arc<DerivedList>,
    fetcher: Arc<dyn ListFetcher>,
    bus: SyncBus,
    focus: Arc<Notify>,
    opts: SyncOptions,
) {
    info!(
        refresh_secs = opts.refresh_interval.as_secs(),
        "list synchronizer started"
    );

    // Subscribe before the initial fetch so no event emitted during the
    // fetch is lost.
    let mut events = bus.subscribe();
    drop(bus);

    let mut interval = tokio::time::interval(opts.refresh_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately — use it as the initial fetch.
    interval.tick().await;
    refresh(&list, fetcher.as_ref()).await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SyncEvent::Add { item }) => {
                    debug!(id = %item.id, "sync: add");
                    list.insert(item).await;
                }
                Ok(SyncEvent::Remove { id }) => {
                    debug!(id = %id, "sync: remove");
                    list.remove(&id).await;
                }
                Ok(SyncEvent::Refresh) => {
                    debug!("sync: refresh requested");
                    refresh(&list, fetcher.as_ref()).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "sync bus lagged — falling back to full refetch");
                    refresh(&list, fetcher.as_ref()).await;
                }
                Err(RecvError::Closed) => {
                    info!("sync bus closed — list synchronizer stopping");
                    return;
                }
            },
            _ = interval.tick() => {
                debug!("interval refresh");
                refresh(&list, fetcher.as_ref()).await;
            }
            _ = focus.notified() => {
                debug!("focus regained — refreshing");
                refresh(&list, fetcher.as_ref()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticFetcher {
        items: Vec<ListItem>,
        calls: AtomicU32,
    }

    impl StaticFetcher {
        fn new(items: Vec<ListItem>) -> Self {
            Self {
                items,
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ListFetcher for StaticFetcher {
        async fn fetch_all(&self) -> anyhow::Result<Vec<ListItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent_by_id() {
        let list = DerivedList::new();
        assert!(list.insert(ListItem::new("x", "Agent X")).await);
        assert!(!list.insert(ListItem::new("x", "Agent X (duplicate)")).await);
        assert_eq!(list.len().await, 1);
        assert_eq!(list.snapshot().await[0].name, "Agent X");
    }

    #[tokio::test]
    async fn remove_absent_id_is_a_no_op() {
        let list = DerivedList::new();
        list.insert(ListItem::new("a", "A")).await;
        assert!(!list.remove("missing").await);
        assert!(list.remove("a").await);
        assert!(!list.remove("a").await);
        assert!(list.is_empty().await);
    }

    #[tokio::test]
    async fn replace_swaps_contents_wholesale() {
        let list = DerivedList::new();
        list.insert(ListItem::new("old", "Old")).await;
        list.replace(vec![ListItem::new("new", "New")]).await;
        assert!(!list.contains("old").await);
        assert!(list.contains("new").await);
    }

    #[tokio::test]
    async fn synchronizer_applies_incremental_events_without_refetch() {
        let list = Arc::new(DerivedList::new());
        let fetcher = Arc::new(StaticFetcher::new(vec![ListItem::new("42", "Tutor Bot")]));
        let bus = SyncBus::new();
        let focus = Arc::new(Notify::new());

        tokio::spawn(run_synchronizer(
            list.clone(),
            fetcher.clone(),
            bus.clone(),
            focus,
            SyncOptions {
                refresh_interval: Duration::from_secs(3600),
            },
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 1, "initial fetch only");
        assert!(list.contains("42").await);

        bus.emit(SyncEvent::Remove { id: "42".into() });
        bus.emit(SyncEvent::Add {
            item: ListItem::new("7", "Essay Reviewer"),
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!list.contains("42").await);
        assert!(list.contains("7").await);
        assert_eq!(fetcher.call_count(), 1, "no network call for deltas");
    }

    #[tokio::test]
    async fn refresh_event_triggers_exactly_one_refetch() {
        let list = Arc::new(DerivedList::new());
        let fetcher = Arc::new(StaticFetcher::new(vec![]));
        let bus = SyncBus::new();
        let focus = Arc::new(Notify::new());

        tokio::spawn(run_synchronizer(
            list,
            fetcher.clone(),
            bus.clone(),
            focus,
            SyncOptions {
                refresh_interval: Duration::from_secs(3600),
            },
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 1);

        // A legacy detail-less event decodes as Refresh.
        bus.emit_json(&serde_json::json!({ "type": "agents-changed" }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn lagged_receiver_falls_back_to_full_refetch() {
        let list = Arc::new(DerivedList::new());
        let fetcher = Arc::new(StaticFetcher::new(vec![ListItem::new("truth", "Source")]));
        let bus = SyncBus::new();
        let focus = Arc::new(Notify::new());

        tokio::spawn(run_synchronizer(
            list.clone(),
            fetcher.clone(),
            bus.clone(),
            focus,
            SyncOptions {
                refresh_interval: Duration::from_secs(3600),
            },
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 1);

        // Flood past the channel capacity without yielding, so the
        // synchronizer wakes up to an overwritten backlog.
        for n in 0..300u32 {
            bus.emit(SyncEvent::Add {
                item: ListItem::new(format!("burst-{n}"), "Burst"),
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            fetcher.call_count(),
            2,
            "one fallback refetch for the lag, none for the surviving deltas"
        );
        assert!(list.contains("truth").await, "refetched contents present");
    }

    #[tokio::test]
    async fn focus_regain_triggers_refetch() {
        let list = Arc::new(DerivedList::new());
        let fetcher = Arc::new(StaticFetcher::new(vec![]));
        let bus = SyncBus::new();
        let focus = Arc::new(Notify::new());

        tokio::spawn(run_synchronizer(
            list,
            fetcher.clone(),
            bus.clone(),
            focus.clone(),
            SyncOptions {
                refresh_interval: Duration::from_secs(3600),
            },
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 1);

        focus.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn interval_refetch_corrects_drift() {
        let list = Arc::new(DerivedList::new());
        let fetcher = Arc::new(StaticFetcher::new(vec![ListItem::new("1", "One")]));
        let bus = SyncBus::new();
        let focus = Arc::new(Notify::new());

        tokio::spawn(run_synchronizer(
            list.clone(),
            fetcher.clone(),
            bus.clone(),
            focus,
            SyncOptions {
                refresh_interval: Duration::from_millis(30),
            },
        ));
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(fetcher.call_count() >= 3, "interval drove repeated fetches");
        assert!(list.contains("1").await);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_current_contents() {
        struct FailingFetcher;

        #[async_trait]
        impl ListFetcher for FailingFetcher {
            async fn fetch_all(&self) -> anyhow::Result<Vec<ListItem>> {
                anyhow::bail!("backend unavailable")
            }
        }

        let list = DerivedList::new();
        list.insert(ListItem::new("keep", "Keep Me")).await;
        refresh(&list, &FailingFetcher).await;
        assert!(list.contains("keep").await);
    }
}
