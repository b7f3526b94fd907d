//! Per-destination circuit breaker.
//!
//! State lives in process memory only; it is not shared across instances or persisted.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time since the last failure before a probe is let through.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    /// Cool-down elapsed (or a probe is in flight); the next call is a probe.
    HalfOpen,
}

/// Point-in-time view of one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub failure_count: u32,
    pub last_failure: Option<Instant>,
    pub is_open: bool,
}

#[derive(Debug, Default)]
struct Entry {
    failure_count: u32,
    last_failure: Option<Instant>,
    is_open: bool,
    probe_in_flight: bool,
}

impl Entry {
    fn cooled_down(&self, cooldown: Duration) -> bool {
        self.last_failure.map_or(true, |t| t.elapsed() >= cooldown)
    }
}

/// Tracks failures per destination key (typically the request URL without its query).
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    entries: DashMap<String, Entry>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Admits a call or fails fast with [`ClientError::CircuitOpen`].
    ///
    /// Once the cool-down has elapsed exactly one probe is admitted; other callers keep
    /// failing fast until the probe reports back. The returned [`Permit`] reports the
    /// outcome; a probe permit dropped without an outcome counts as a failed probe.
    pub fn acquire(&self, key: &str) -> Result<Permit<'_>, ClientError> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(Permit::new(self, key, false));
        };
        if !entry.is_open {
            return Ok(Permit::new(self, key, false));
        }
        if !entry.probe_in_flight && entry.cooled_down(self.config.cooldown) {
            entry.probe_in_flight = true;
            info!(destination = key, "Circuit half-open; letting probe through");
            return Ok(Permit::new(self, key, true));
        }
        debug!(destination = key, "Circuit open; failing fast");
        Err(ClientError::CircuitOpen {
            destination: key.to_string(),
        })
    }

    /// Closes the circuit and resets the failure count.
    pub fn record_success(&self, key: &str) {
        if let Some((_, previous)) = self.entries.remove(key) {
            if previous.is_open {
                info!(destination = key, "Probe succeeded; circuit closed");
            }
        }
    }

    /// Counts a failure; opens the circuit at the threshold and restarts the cool-down clock.
    pub fn record_failure(&self, key: &str) {
        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.failure_count = entry.failure_count.saturating_add(1);
        entry.last_failure = Some(Instant::now());
        let was_probe = std::mem::take(&mut entry.probe_in_flight);

        if !entry.is_open && entry.failure_count >= self.config.failure_threshold {
            entry.is_open = true;
            warn!(
                destination = key,
                failures = entry.failure_count,
                "Circuit opened"
            );
        } else if was_probe {
            warn!(destination = key, "Probe failed; circuit stays open");
        }
    }

    pub fn state(&self, key: &str) -> CircuitState {
        match self.entries.get(key) {
            None => CircuitState::Closed,
            Some(entry) if !entry.is_open => CircuitState::Closed,
            Some(entry) if entry.probe_in_flight || entry.cooled_down(self.config.cooldown) => {
                CircuitState::HalfOpen
            }
            Some(_) => CircuitState::Open,
        }
    }

    pub fn snapshot(&self, key: &str) -> BreakerSnapshot {
        match self.entries.get(key) {
            Some(entry) => BreakerSnapshot {
                failure_count: entry.failure_count,
                last_failure: entry.last_failure,
                is_open: entry.is_open,
            },
            None => BreakerSnapshot {
                failure_count: 0,
                last_failure: None,
                is_open: false,
            },
        }
    }

    pub fn reset(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Admission to call a destination, returned by [`CircuitBreaker::acquire`].
#[must_use = "report the outcome with `success` or `failure`"]
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    key: String,
    probe: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, key: &str, probe: bool) -> Self {
        Self {
            breaker,
            key: key.to_string(),
            probe,
            settled: false,
        }
    }

    /// True when this call is the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success(&self.key);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure(&self.key);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        // A cancelled probe must not hold the half-open slot forever.
        if self.probe && !self.settled {
            warn!(destination = %self.key, "Probe abandoned before completing");
            self.breaker.record_failure(&self.key);
        }
    }
}
