// SPDX-License-Identifier: MIT
//! Process-wide bootstrap status and readiness latch.
//!
//! [`ReadinessPublisher`] is the single mutable shared resource of the
//! bootstrap subsystem: one writer role (the sequencer, with the timeout
//! failsafe as a secondary forcing path), arbitrarily many readers. Readers
//! get a synchronous [`snapshot`](ReadinessPublisher::snapshot) for
//! render-before-subscribe cases and an async
//! [`subscribe`](ReadinessPublisher::subscribe) for late transitions.
//!
//! Write discipline:
//! - [`BootstrapStatus`] transitions exactly once, `Pending` → terminal, and
//!   never reverts. A late-resolving attempt that lands after the failsafe
//!   already published is a no-op.
//! - [`Readiness`] only moves forward: `NotStarted` → `InProgress` → `Ready`.
//!   Once `Ready`, never anything else. `Ready` with status `Error` is the
//!   fail-open combination and is legal.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

/// Terminal-once bootstrap status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStatus {
    /// Bootstrap has not yet produced a terminal outcome.
    Pending,
    /// Interception is installed and armed (or vacuously unnecessary).
    Success,
    /// All install attempts were exhausted. The app still proceeds (fail-open).
    Error,
}

impl std::fmt::Display for BootstrapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One-way readiness latch, kept separate from [`BootstrapStatus`].
///
/// `InProgress` is a distinct sentinel so late-arriving consumers can tell
/// "bootstrap never started" apart from "bootstrap is underway".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    NotStarted,
    InProgress,
    Ready,
}

/// Current value held by the publisher. Cheap to clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessSnapshot {
    pub status: BootstrapStatus,
    pub readiness: Readiness,
}

impl ReadinessSnapshot {
    /// `true` once the application may issue network traffic.
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }
}

impl Default for ReadinessSnapshot {
    fn default() -> Self {
        Self {
            status: BootstrapStatus::Pending,
            readiness: Readiness::NotStarted,
        }
    }
}

/// Snapshot + subscribe container for the bootstrap state.
///
/// Cheaply cloneable — all clones share the same channel. Only the current
/// value is retained; there is no history buffer, so late subscribers see the
/// latest state and future transitions, never past ones.
#[derive(Clone)]
pub struct ReadinessPublisher {
    tx: watch::Sender<ReadinessSnapshot>,
}

/// Process-wide default instance, for code paths that must check readiness
/// synchronously without plumbing a handle.
static GLOBAL: Lazy<ReadinessPublisher> = Lazy::new(ReadinessPublisher::new);

impl ReadinessPublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ReadinessSnapshot::default());
        Self { tx }
    }

    /// The process-wide publisher. Created on first access, lives for the
    /// process lifetime.
    pub fn global() -> &'static ReadinessPublisher {
        &GLOBAL
    }

    /// Current state, readable synchronously from any context.
    pub fn snapshot(&self) -> ReadinessSnapshot {
        *self.tx.borrow()
    }

    /// `true` once [`mark_ready`](Self::mark_ready) has fired.
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_ready()
    }

    /// Watch for state changes. The receiver always starts at the current
    /// value; there is no replay of earlier transitions.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessSnapshot> {
        self.tx.subscribe()
    }

    /// Publish a terminal status. Returns `true` if the write took effect.
    ///
    /// Only the first `Pending` → terminal transition wins; every later call
    /// (a stale retry landing after the failsafe, a duplicate publish) is a
    /// logged no-op.
    pub fn publish(&self, status: BootstrapStatus) -> bool {
        if status == BootstrapStatus::Pending {
            return false;
        }
        let changed = self.tx.send_if_modified(|snap| {
            if snap.status != BootstrapStatus::Pending {
                return false;
            }
            snap.status = status;
            true
        });
        if changed {
            info!(status = %status, "bootstrap status published");
        } else {
            warn!(status = %status, "stale bootstrap publish ignored — status already terminal");
        }
        changed
    }

    /// Move readiness from `NotStarted` to `InProgress`. No-op in any other
    /// state.
    pub fn mark_in_progress(&self) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.readiness != Readiness::NotStarted {
                return false;
            }
            snap.readiness = Readiness::InProgress;
            true
        })
    }

    /// Latch readiness to `Ready`. Returns `true` on the first call only.
    pub fn mark_ready(&self) -> bool {
        let changed = self.tx.send_if_modified(|snap| {
            if snap.readiness == Readiness::Ready {
                return false;
            }
            snap.readiness = Readiness::Ready;
            true
        });
        if changed {
            info!(status = %self.snapshot().status, "application marked ready");
        }
        changed
    }
}

impl Default for ReadinessPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadinessPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessPublisher")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
