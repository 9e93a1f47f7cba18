// SPDX-License-Identifier: MIT
//! User-facing notification channel (toast-equivalent).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A one-shot message destined for whatever toast/banner UI is mounted.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

/// Broadcasts notices to all mounted notification surfaces.
#[derive(Clone)]
pub struct NoticeBroadcaster {
    tx: broadcast::Sender<Notice>,
}

impl Default for NoticeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Send a notice to all subscribers.
    pub fn emit(&self, level: NoticeLevel, message: impl Into<String>) {
        // Ignore errors — no subscribers is fine
        let _ = self.tx.send(Notice {
            level,
            message: message.into(),
            emitted_at: Utc::now(),
        });
    }

    /// Shorthand for an error-level notice.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Error, message);
    }

    /// Subscribe to all notices emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}
