// SPDX-License-Identifier: MIT
//! Bootstrap sequencer — drives engine install/start exactly once per process.
//!
//! The sequencer owns the attempt guard and the retry loop. Its `start()`
//! always resolves with a [`BootstrapStatus`], never an error: a failed
//! bootstrap degrades functionality (real requests hit unmocked endpoints)
//! instead of blocking the UI, so exhaustion publishes `Error`, latches
//! readiness anyway (fail-open), and emits a one-shot user-facing notice.

use crate::config::MockBootConfig;
use crate::engine::{EngineError, InterceptionEngine, StartConfig};
use crate::notice::NoticeBroadcaster;
use crate::readiness::{BootstrapStatus, ReadinessPublisher};
use crate::retry::{retry_with_policy_if, RetryPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Message shown once when all install attempts are exhausted. A manual
/// reload is the designed recovery path.
const EXHAUSTED_NOTICE: &str =
    "Mock layer failed to start — some data may be unavailable. Reload the page to retry.";

/// Singleton driver for the interception-engine bootstrap.
pub struct BootstrapSequencer {
    engine: Arc<dyn InterceptionEngine>,
    publisher: ReadinessPublisher,
    notices: NoticeBroadcaster,
    policy: RetryPolicy,
    start_config: StartConfig,
    enabled: bool,
    // Attempt guard: set on first start(), never reset.
    started: AtomicBool,
}

impl BootstrapSequencer {
    pub fn new(
        config: &MockBootConfig,
        engine: Arc<dyn InterceptionEngine>,
        publisher: ReadinessPublisher,
        notices: NoticeBroadcaster,
    ) -> Self {
        Self {
            engine,
            publisher,
            notices,
            policy: config.retry_policy(),
            start_config: StartConfig::default(),
            enabled: config.enabled,
            started: AtomicBool::new(false),
        }
    }

    /// Replace the default unhandled-request policy before starting.
    pub fn with_start_config(mut self, start_config: StartConfig) -> Self {
        self.start_config = start_config;
        self
    }

    /// The publisher this sequencer writes to.
    pub fn publisher(&self) -> &ReadinessPublisher {
        &self.publisher
    }

    /// Run the bootstrap sequence.
    ///
    /// Idempotent: every call after the first (including concurrent calls
    /// racing on mount) returns the current status immediately with no side
    /// effects — exactly one engine install sequence runs per process.
    pub async fn start(&self) -> BootstrapStatus {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("bootstrap already started — ignoring duplicate start");
            return self.publisher.snapshot().status;
        }

        // Nothing to intercept: disabled by config or unsupported runtime.
        // Either way the layer is vacuously ready.
        if !self.enabled {
            info!("mock layer disabled by configuration — vacuously ready");
            return self.finish_success();
        }
        if !self.engine.is_supported() {
            info!("interception mechanism unsupported in this environment — vacuously ready");
            return self.finish_success();
        }

        self.publisher.mark_in_progress();
        info!(
            max_attempts = self.policy.max_attempts,
            delay_ms = self.policy.delay.as_millis(),
            "mock layer bootstrap starting"
        );

        let result = retry_with_policy_if(
            &self.policy,
            || async {
                self.engine.install().await?;
                self.engine.start(&self.start_config).await
            },
            EngineError::is_retryable,
        )
        .await;

        match result {
            Ok(()) => {
                info!("mock layer armed");
                self.finish_success()
            }
            // Some runtimes only reveal a missing capability once install is
            // tried. Same outcome as the upfront check: nothing to intercept.
            Err(EngineError::Unsupported) => {
                info!("interception mechanism reported unsupported at install — vacuously ready");
                self.finish_success()
            }
            Err(e) => {
                error!(err = %e, "mock layer bootstrap failed — continuing without interception");
                self.publisher.publish(BootstrapStatus::Error);
                // Fail-open: the application must not hang because the mock
                // layer never started.
                self.publisher.mark_ready();
                self.notices.error(EXHAUSTED_NOTICE);
                BootstrapStatus::Error
            }
        }
    }

    /// Tear down interception. Not exercised on the steady-state path.
    pub fn stop(&self) {
        self.engine.stop();
    }

    fn finish_success(&self) -> BootstrapStatus {
        self.publisher.publish(BootstrapStatus::Success);
        self.publisher.mark_ready();
        BootstrapStatus::Success
    }
}

impl std::fmt::Debug for BootstrapSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapSequencer")
            .field("enabled", &self.enabled)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}
