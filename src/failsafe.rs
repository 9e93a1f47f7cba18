// SPDX-License-Identifier: MIT
//! Wall-clock failsafe around the bootstrap sequence.
//!
//! Races the sequencer against a whole-sequence timer. Whichever settles
//! first controls the readiness latch; the loser's eventual settlement is
//! absorbed by the publisher's already-published checks. The sequencer task
//! is never cancelled — a hung `install()` keeps running detached and its
//! late publish is tolerated, but the UI is unblocked after the timeout.

use crate::readiness::BootstrapStatus;
use crate::sequencer::BootstrapSequencer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Primary defense against UI deadlock: forces readiness after a fixed
/// budget regardless of sequencer state.
#[derive(Debug, Clone)]
pub struct TimeoutFailsafe {
    timeout: Duration,
}

impl TimeoutFailsafe {
    /// Default whole-sequence budget, distinct from the per-attempt retry delay.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `sequencer.start()` under the failsafe timer.
    ///
    /// Returns the sequencer's status if it settles in time. On timeout the
    /// readiness latch is forced, the status is left at whatever it last was
    /// (normally still `Pending`), and the sequencer keeps running in the
    /// background — a late success or failure may still update the status
    /// but can no longer block anything.
    pub async fn run(&self, sequencer: Arc<BootstrapSequencer>) -> BootstrapStatus {
        let publisher = sequencer.publisher().clone();
        let task = tokio::spawn({
            let sequencer = Arc::clone(&sequencer);
            async move { sequencer.start().await }
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(status)) => status,
            Ok(Err(join_err)) => {
                // The sequencer task panicked. Treat like a timeout: unblock
                // the UI and leave the status alone.
                error!(err = %join_err, "bootstrap task aborted — forcing readiness");
                publisher.mark_ready();
                publisher.snapshot().status
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "bootstrap did not settle within the failsafe budget — forcing readiness"
                );
                publisher.mark_ready();
                publisher.snapshot().status
            }
        }
    }
}

impl Default for TimeoutFailsafe {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockBootConfig;
    use crate::engine::{EngineError, InterceptionEngine, StartConfig};
    use crate::notice::NoticeBroadcaster;
    use crate::readiness::ReadinessPublisher;
    use async_trait::async_trait;

    /// Engine whose install never settles.
    struct HungEngine;

    #[async_trait]
    impl InterceptionEngine for HungEngine {
        async fn install(&self) -> Result<(), EngineError> {
            std::future::pending().await
        }
        async fn start(&self, _config: &StartConfig) -> Result<(), EngineError> {
            Ok(())
        }
        fn stop(&self) {}
    }

    struct InstantEngine;

    #[async_trait]
    impl InterceptionEngine for InstantEngine {
        async fn install(&self) -> Result<(), EngineError> {
            Ok(())
        }
        async fn start(&self, _config: &StartConfig) -> Result<(), EngineError> {
            Ok(())
        }
        fn stop(&self) {}
    }

    #[tokio::test]
    async fn timeout_forces_readiness_when_install_hangs() {
        let seq = Arc::new(BootstrapSequencer::new(
            &MockBootConfig::default(),
            Arc::new(HungEngine),
            ReadinessPublisher::new(),
            NoticeBroadcaster::new(),
        ));
        let failsafe = TimeoutFailsafe::new(Duration::from_millis(20));

        let start = std::time::Instant::now();
        let status = failsafe.run(seq.clone()).await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(status, BootstrapStatus::Pending, "status left as-is");
        assert!(seq.publisher().is_ready(), "readiness forced by failsafe");
    }

    #[tokio::test]
    async fn fast_sequencer_wins_the_race() {
        let seq = Arc::new(BootstrapSequencer::new(
            &MockBootConfig::default(),
            Arc::new(InstantEngine),
            ReadinessPublisher::new(),
            NoticeBroadcaster::new(),
        ));
        let failsafe = TimeoutFailsafe::default();

        let status = failsafe.run(seq.clone()).await;

        assert_eq!(status, BootstrapStatus::Success);
        assert!(seq.publisher().is_ready());
    }

    #[tokio::test]
    async fn late_sequencer_result_cannot_unset_readiness() {
        // Engine that settles well after the failsafe fires.
        struct SlowFailEngine;

        #[async_trait]
        impl InterceptionEngine for SlowFailEngine {
            async fn install(&self) -> Result<(), EngineError> {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(EngineError::Install("slow refusal".into()))
            }
            async fn start(&self, _config: &StartConfig) -> Result<(), EngineError> {
                Ok(())
            }
            fn stop(&self) {}
        }

        let config = MockBootConfig {
            max_attempts: 1,
            ..Default::default()
        };
        let seq = Arc::new(BootstrapSequencer::new(
            &config,
            Arc::new(SlowFailEngine),
            ReadinessPublisher::new(),
            NoticeBroadcaster::new(),
        ));
        let publisher = seq.publisher().clone();
        let failsafe = TimeoutFailsafe::new(Duration::from_millis(10));

        let status = failsafe.run(seq).await;
        assert_eq!(status, BootstrapStatus::Pending);
        assert!(publisher.is_ready());

        // Let the detached sequencer finish: its late Error publish lands,
        // but readiness stays latched.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snap = publisher.snapshot();
        assert_eq!(snap.status, BootstrapStatus::Error);
        assert!(snap.is_ready());
    }
}
