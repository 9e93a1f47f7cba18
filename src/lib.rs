// SPDX-License-Identifier: MIT
//! mockboot — mock network-layer bootstrap and readiness coordination.
//!
//! Installs the request-interception engine before any application code
//! issues network calls, with bounded retries, a wall-clock failsafe, and a
//! fail-open policy: permanent installation failure degrades functionality
//! instead of blocking the UI. Status is broadcast to arbitrarily many
//! independent subscribers, and a derived list (the sidebar's agent list) is
//! kept eventually consistent through a typed sync bus plus periodic and
//! focus-triggered refetches.

pub mod config;
pub mod engine;
pub mod failsafe;
pub mod indicator;
pub mod notice;
pub mod readiness;
pub mod retry;
pub mod sequencer;
pub mod sync;

pub use config::MockBootConfig;
pub use engine::{InterceptionEngine, StartConfig, UnhandledAction, UnhandledRequest};
pub use failsafe::TimeoutFailsafe;
pub use notice::{Notice, NoticeBroadcaster, NoticeLevel};
pub use readiness::{BootstrapStatus, Readiness, ReadinessPublisher, ReadinessSnapshot};
pub use retry::RetryPolicy;
pub use sequencer::BootstrapSequencer;
pub use sync::{DerivedList, ListFetcher, ListItem, SyncBus, SyncEvent};

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Top-level handle wiring the bootstrap subsystem together.
///
/// One instance per process; components that only need a slice of it
/// (readiness, notices, the sync bus) take their own cheap clone.
#[derive(Clone)]
pub struct MockLayer {
    config: MockBootConfig,
    sequencer: Arc<BootstrapSequencer>,
    failsafe: TimeoutFailsafe,
    notices: NoticeBroadcaster,
    bus: SyncBus,
}

impl MockLayer {
    /// Wire the layer with its own private publisher (useful in tests and
    /// embedded setups).
    pub fn new(config: MockBootConfig, engine: Arc<dyn InterceptionEngine>) -> Self {
        Self::with_publisher(config, engine, ReadinessPublisher::new())
    }

    /// Wire the layer against the process-wide publisher so any code path
    /// can check readiness synchronously via [`ReadinessPublisher::global`].
    pub fn with_global_publisher(
        config: MockBootConfig,
        engine: Arc<dyn InterceptionEngine>,
    ) -> Self {
        Self::with_publisher(config, engine, ReadinessPublisher::global().clone())
    }

    fn with_publisher(
        config: MockBootConfig,
        engine: Arc<dyn InterceptionEngine>,
        publisher: ReadinessPublisher,
    ) -> Self {
        let notices = NoticeBroadcaster::new();
        let sequencer = Arc::new(BootstrapSequencer::new(
            &config,
            engine,
            publisher,
            notices.clone(),
        ));
        let failsafe = TimeoutFailsafe::new(config.bootstrap_timeout());
        Self {
            config,
            sequencer,
            failsafe,
            notices,
            bus: SyncBus::new(),
        }
    }

    /// Run the bootstrap under the failsafe timer. Safe to call from every
    /// mounting subtree; only the first call does any work.
    pub async fn bootstrap(&self) -> BootstrapStatus {
        self.failsafe.run(Arc::clone(&self.sequencer)).await
    }

    /// Readiness snapshot/subscribe handle.
    pub fn readiness(&self) -> &ReadinessPublisher {
        self.sequencer.publisher()
    }

    /// User-facing notification channel.
    pub fn notices(&self) -> &NoticeBroadcaster {
        &self.notices
    }

    /// Incremental-update channel for derived lists.
    pub fn sync_bus(&self) -> &SyncBus {
        &self.bus
    }

    /// Create a derived list and spawn its synchronizer task.
    ///
    /// `focus` is the focus-regain signal; notify it when the window regains
    /// focus. The task ends when every [`SyncBus`] handle is dropped.
    pub fn spawn_list_sync(
        &self,
        fetcher: Arc<dyn ListFetcher>,
        focus: Arc<Notify>,
    ) -> (Arc<DerivedList>, JoinHandle<()>) {
        let list = Arc::new(DerivedList::new());
        let task = tokio::spawn(sync::run_synchronizer(
            Arc::clone(&list),
            fetcher,
            self.bus.clone(),
            focus,
            sync::SyncOptions {
                refresh_interval: self.config.refresh_interval(),
            },
        ));
        (list, task)
    }

    /// Tear down interception (teardown symmetry; unused on the steady-state
    /// path).
    pub fn stop(&self) {
        self.sequencer.stop();
    }
}
