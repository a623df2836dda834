//! Circuit breaker shared by the storage pools.
//!
//! After `failure_threshold` consecutive failures the breaker opens and
//! rejects calls for `reset_timeout_ms`; it then lets probe calls through
//! (half-open) and closes again after `success_threshold` successes.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    2
}

fn default_reset_timeout_ms() -> u64 {
    30_000 // 30 seconds
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}

/// Lock-free circuit breaker guarding one storage backend
pub struct CircuitBreaker {
    /// Backend name for log lines
    name: &'static str,
    state: AtomicU8,
    failures: AtomicU32,
    successes: AtomicU32,
    /// Last state change, ms since epoch
    changed_at_ms: AtomicI64,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            failures: AtomicU32::new(0),
            successes: AtomicU32::new(0),
            changed_at_ms: AtomicI64::new(now_ms()),
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.maybe_half_open();
        self.raw_state()
    }

    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        match self.raw_state() {
            CircuitState::Closed => self.failures.store(0, Ordering::Release),
            CircuitState::HalfOpen => {
                let successes = self.successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.config.success_threshold {
                    self.transition(CircuitState::Closed);
                    tracing::info!(backend = self.name, "Circuit breaker closed after recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        match self.raw_state() {
            CircuitState::Closed => {
                let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    self.transition(CircuitState::Open);
                    tracing::warn!(
                        backend = self.name,
                        failures = failures,
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                self.transition(CircuitState::Open);
                tracing::warn!(backend = self.name, "Circuit breaker reopened by probe failure");
            }
            CircuitState::Open => self.changed_at_ms.store(now_ms(), Ordering::Release),
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    fn raw_state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    fn maybe_half_open(&self) {
        if self.raw_state() != CircuitState::Open {
            return;
        }
        let elapsed = now_ms() - self.changed_at_ms.load(Ordering::Acquire);
        if elapsed < self.config.reset_timeout_ms as i64 {
            return;
        }
        if self
            .state
            .compare_exchange(
                CircuitState::Open as u8,
                CircuitState::HalfOpen as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.successes.store(0, Ordering::Release);
            self.changed_at_ms.store(now_ms(), Ordering::Release);
            tracing::info!(backend = self.name, "Circuit breaker half-open");
        }
    }

    fn transition(&self, to: CircuitState) {
        self.state.store(to as u8, Ordering::Release);
        self.changed_at_ms.store(now_ms(), Ordering::Release);
        self.successes.store(0, Ordering::Release);
        if to == CircuitState::Closed {
            self.failures.store(0, Ordering::Release);
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
