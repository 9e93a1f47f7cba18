// SPDX-License-Identifier: MIT
//! Example readiness subscriber: a small persistent status light.

use crate::readiness::{BootstrapStatus, ReadinessPublisher, ReadinessSnapshot};
use tokio::sync::watch;

/// Color shown by the indicator widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    /// Bootstrap still pending.
    Amber,
    /// Mock layer armed.
    Green,
    /// Bootstrap failed; the app runs degraded.
    Red,
}

/// Cosmetic subscriber mapping the readiness snapshot to a color and label.
///
/// Each mounted indicator holds its own receiver; any number can coexist
/// without coordinating.
pub struct StatusIndicator {
    rx: watch::Receiver<ReadinessSnapshot>,
}

impl StatusIndicator {
    pub fn new(publisher: &ReadinessPublisher) -> Self {
        Self {
            rx: publisher.subscribe(),
        }
    }

    pub fn color(&self) -> IndicatorColor {
        match self.rx.borrow().status {
            BootstrapStatus::Pending => IndicatorColor::Amber,
            BootstrapStatus::Success => IndicatorColor::Green,
            BootstrapStatus::Error => IndicatorColor::Red,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.rx.borrow().status {
            BootstrapStatus::Pending => "mock layer starting",
            BootstrapStatus::Success => "mock layer active",
            BootstrapStatus::Error => "mock layer unavailable",
        }
    }

    /// Whether the gated children slot may render yet.
    pub fn ready(&self) -> bool {
        self.rx.borrow().is_ready()
    }

    /// Wait for the next state transition.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
