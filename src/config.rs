// SPDX-License-Identifier: MIT
//! Bootstrap subsystem configuration.
//!
//! Read once at process start and immutable for the process lifetime.
//! Priority (highest to lowest):
//!   1. `MOCKBOOT_*` environment variables
//!   2. TOML file (`mockboot.toml`, if a path is supplied)
//!   3. Built-in defaults

use crate::retry::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::error;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_BOOTSTRAP_TIMEOUT_MS: u64 = 5000;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Configuration switches for the mock-layer bootstrap (`mockboot.toml`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockBootConfig {
    /// Enable the bootstrap subsystem. When false the layer reports a vacuous
    /// success and never touches the interception engine. Default: true.
    pub enabled: bool,
    /// Install/start attempts before giving up (including the first).
    /// 0 is treated as 1 — the install always runs at least once. Default: 3.
    pub max_attempts: u32,
    /// Fixed delay between attempts (milliseconds). Default: 1000.
    pub retry_delay_ms: u64,
    /// Whole-sequence failsafe timeout (milliseconds), distinct from the
    /// per-attempt delay. Default: 5000.
    pub bootstrap_timeout_ms: u64,
    /// Derived-list full-refetch interval (seconds). Default: 30.
    pub refresh_interval_secs: u64,
}

impl Default for MockBootConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            bootstrap_timeout_ms: DEFAULT_BOOTSTRAP_TIMEOUT_MS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

fn load_toml(path: &Path) -> Option<MockBootConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<MockBootConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse mockboot.toml — using defaults");
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(name: &str) -> Option<bool> {
    parse_bool(&std::env::var(name).ok()?)
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}

impl MockBootConfig {
    /// Build config from env + optional TOML file.
    pub fn load(path: Option<&Path>) -> Self {
        let toml = path.and_then(load_toml).unwrap_or_default();

        Self {
            enabled: env_bool("MOCKBOOT_ENABLED").unwrap_or(toml.enabled),
            max_attempts: env_u32("MOCKBOOT_MAX_ATTEMPTS").unwrap_or(toml.max_attempts),
            retry_delay_ms: env_u64("MOCKBOOT_RETRY_DELAY_MS").unwrap_or(toml.retry_delay_ms),
            bootstrap_timeout_ms: env_u64("MOCKBOOT_TIMEOUT_MS")
                .unwrap_or(toml.bootstrap_timeout_ms),
            refresh_interval_secs: env_u64("MOCKBOOT_REFRESH_SECS")
                .unwrap_or(toml.refresh_interval_secs),
        }
    }

    /// Retry policy for the bootstrap sequencer.
    ///
    /// `max_attempts` is clamped to at least 1: a zero attempt budget from
    /// the environment or a config file must not keep the install from ever
    /// running (or panic the retry driver).
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay: Duration::from_millis(self.retry_delay_ms),
            backoff: Backoff::Fixed,
        }
    }

    /// Whole-sequence failsafe budget.
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }

    /// Derived-list drift-correction interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
