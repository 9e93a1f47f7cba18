// SPDX-License-Identifier: MIT
//! Binding for the external network-interception engine.
//!
//! The engine itself (service-worker registration, request matching, mock
//! responses) lives outside this crate. We consume its lifecycle through
//! [`InterceptionEngine`] and hand it an unhandled-request policy at start.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Errors surfaced by the interception engine binding.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The runtime does not support the interception mechanism. Non-retryable.
    #[error("interception mechanism unavailable in this environment")]
    Unsupported,
    /// Registration of the interception mechanism failed. Retryable.
    #[error("engine install failed: {0}")]
    Install(String),
    /// Activation failed after a successful install. Retryable.
    #[error("engine start failed: {0}")]
    Start(String),
}

impl EngineError {
    /// Whether another attempt could plausibly succeed. A missing runtime
    /// capability never heals by retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EngineError::Unsupported)
    }
}

/// A request that reached the engine without a matching mock handler.
#[derive(Debug, Clone)]
pub struct UnhandledRequest {
    pub method: String,
    pub url: String,
}

/// What the engine should do with an unhandled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhandledAction {
    /// Let the request through silently (static assets, telemetry, etc.).
    Bypass,
    /// Let the request through but log a warning (likely a missing mock).
    Warn,
}

/// Policy callback invoked by the engine once per unhandled request.
pub type UnhandledRequestPolicy = Arc<dyn Fn(&UnhandledRequest) -> UnhandledAction + Send + Sync>;

/// Configuration handed to [`InterceptionEngine::start`].
#[derive(Clone)]
pub struct StartConfig {
    /// Decides per request whether an unmatched request is a quiet bypass or
    /// a warning. See [`default_unhandled_policy`].
    pub on_unhandled: UnhandledRequestPolicy,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            on_unhandled: Arc::new(default_unhandled_policy),
        }
    }
}

impl std::fmt::Debug for StartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartConfig").finish_non_exhaustive()
    }
}

/// Default unhandled-request policy: warn on API-looking requests, bypass
/// everything else (static assets, source maps, favicons) quietly.
pub fn default_unhandled_policy(req: &UnhandledRequest) -> UnhandledAction {
    if req.url.contains("/api/") {
        warn!(method = %req.method, url = %req.url, "unmatched API request — no mock handler");
        UnhandledAction::Warn
    } else {
        debug!(method = %req.method, url = %req.url, "bypassing non-API request");
        UnhandledAction::Bypass
    }
}

/// Lifecycle contract of the external interception engine.
///
/// `install` and `start` are the two awaited calls the bootstrap sequencer
/// retries; `stop` exists for teardown symmetry and is not exercised on the
/// steady-state path.
#[async_trait]
pub trait InterceptionEngine: Send + Sync {
    /// Whether the current runtime supports the interception mechanism at all.
    ///
    /// Returning `false` short-circuits the bootstrap as a vacuous success —
    /// there is nothing to intercept, so nothing blocks the application.
    fn is_supported(&self) -> bool {
        true
    }

    /// Register the interception mechanism with the runtime. Idempotent.
    async fn install(&self) -> Result<(), EngineError>;

    /// Activate interception with the given unhandled-request policy.
    async fn start(&self, config: &StartConfig) -> Result<(), EngineError>;

    /// Deactivate interception.
    fn stop(&self);
}
