// SPDX-License-Identifier: GPL-3.0-only
//! Bus exclusion and bounded retries
//!
//! The monitor control bus is one exclusive physical resource. Every
//! transport call in the process goes through a [`RetryableAccessor`], which
//! holds the [`BusLock`] for the whole retry loop so that no two calls ever
//! overlap, across all properties and all displays.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::config::{Config, DEFAULT_ATTEMPTS};
use crate::error::{Result, VcpError};
use crate::protocols::{VcpReading, VcpTransport};

/// Process-wide bus lock shared by every control on every display
static GLOBAL_BUS: Lazy<BusLock> = Lazy::new(BusLock::new);

/// Exclusion token for the control bus
///
/// Clones share the same lock. Use [`BusLock::global`] in production; scoping
/// the lock per device would let two displays talk on the bus at once.
#[derive(Debug, Clone, Default)]
pub struct BusLock {
    inner: Arc<Mutex<()>>,
}

impl BusLock {
    /// A fresh lock, independent of the global one
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock
    pub fn global() -> Self {
        GLOBAL_BUS.clone()
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn same_as(&self, other: &BusLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// How hard to try a single transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// One control's get/set pair wrapped in a locked, bounded retry loop
#[derive(Clone)]
pub struct RetryableAccessor {
    label: Arc<str>,
    transport: Arc<dyn VcpTransport>,
    component: usize,
    bus: BusLock,
    policy: RetryPolicy,
}

impl RetryableAccessor {
    pub fn new(
        label: Arc<str>,
        transport: Arc<dyn VcpTransport>,
        component: usize,
        bus: BusLock,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            label,
            transport,
            component,
            bus,
            policy,
        }
    }

    pub fn label(&self) -> &Arc<str> {
        &self.label
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Read min/value/max, stopping at the first successful attempt
    pub fn read(&self) -> Result<VcpReading> {
        self.with_retries("read", || self.transport.read(self.component))
    }

    /// Write `value`, stopping at the first successful attempt
    pub fn write(&self, value: u32) -> Result<()> {
        self.with_retries("write", || self.transport.write(self.component, value))
    }

    fn with_retries<T>(&self, op: &str, mut call: impl FnMut() -> anyhow::Result<T>) -> Result<T> {
        let attempts = self.policy.attempts.max(1);
        let _bus = self.bus.lock();

        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(property = %self.label, "{} succeeded on attempt {}", op, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if attempt < attempts => {
                    debug!(property = %self.label, "{} attempt {} failed: {}", op, attempt, err);
                    if !self.policy.delay.is_zero() {
                        std::thread::sleep(self.policy.delay);
                    }
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        property = %self.label,
                        error = %err,
                        "{} failed after {} attempt(s)", op, attempts
                    );
                    return Err(VcpError::RetriesExhausted {
                        property: self.label.to_string(),
                        attempts,
                        source: err,
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for RetryableAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryableAccessor")
            .field("label", &self.label)
            .field("component", &self.component)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
