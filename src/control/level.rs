// SPDX-License-Identifier: GPL-3.0-only
//! Continuous level control
//!
//! # Cache
//!
//! `min`, `max` and `value` hold the last values the hardware confirmed. They
//! change only after a successful read, or (for `value`) after a successful
//! write; a failed bus call never touches them. Before the first successful
//! read the bounds are zero and [`LevelControl::has_reading`] is false.
//!
//! # Writes
//!
//! - [`LevelControl::set_sync`]: one retried write, cache updated optimistically
//! - [`LevelControl::set_checked`]: write then read back, repeated until the
//!   device reports the target or the verify budget runs out
//! - [`LevelControl::set_async`]: publish the request immediately and hand a
//!   checked write to this control's [`LossyWorker`]; a burst of requests only
//!   drives the last one to the bus

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::bus::RetryableAccessor;
use crate::control::ControlContext;
use crate::error::{Result, VcpError};
use crate::observer::{ChangedValue, Observable, VcpChange};
use crate::protocols::{VcpReading, VcpTransport};
use crate::worker::LossyWorker;

struct LevelState {
    accessor: RetryableAccessor,
    verify_attempts: u32,
    observer: Arc<dyn Observable>,
    min: AtomicU32,
    value: AtomicU32,
    max: AtomicU32,
    has_reading: AtomicBool,
    requested: Mutex<Option<u32>>,
}

pub struct LevelControl {
    state: Arc<LevelState>,
    worker: LossyWorker,
}

impl LevelControl {
    /// Control for `component` of `transport`, with its own async worker
    pub fn new(
        ctx: &ControlContext,
        label: impl Into<Arc<str>>,
        transport: Arc<dyn VcpTransport>,
        component: usize,
    ) -> Result<Self> {
        let label = label.into();
        let accessor = RetryableAccessor::new(
            Arc::clone(&label),
            transport,
            component,
            ctx.bus.clone(),
            ctx.policy,
        );
        let worker = LossyWorker::spawn(label.to_string())?;

        Ok(Self {
            state: Arc::new(LevelState {
                accessor,
                verify_attempts: ctx.verify_attempts.max(1),
                observer: Arc::clone(&ctx.observer),
                min: AtomicU32::new(0),
                value: AtomicU32::new(0),
                max: AtomicU32::new(0),
                has_reading: AtomicBool::new(false),
                requested: Mutex::new(None),
            }),
            worker,
        })
    }

    pub fn label(&self) -> &str {
        self.state.label()
    }

    /// Last confirmed value
    pub fn value(&self) -> u32 {
        self.state.value.load(Ordering::Acquire)
    }

    /// Last reported minimum; zero until [`LevelControl::has_reading`]
    pub fn min(&self) -> u32 {
        self.state.min.load(Ordering::Acquire)
    }

    /// Last reported maximum; zero until [`LevelControl::has_reading`]
    pub fn max(&self) -> u32 {
        self.state.max.load(Ordering::Acquire)
    }

    pub fn has_reading(&self) -> bool {
        self.state.has_reading.load(Ordering::Acquire)
    }

    /// Target of an asynchronous write that has not finished yet
    pub fn requested(&self) -> Option<u32> {
        *self.state.requested()
    }

    /// What a slider should show: the pending request, else the confirmed value
    pub fn displayed(&self) -> u32 {
        self.requested().unwrap_or_else(|| self.value())
    }

    /// Read min/value/max from the device and refresh the cache
    pub fn get(&self) -> Result<VcpReading> {
        self.state.get()
    }

    /// One retried write; on success the cache assumes the device took it
    pub fn set_sync(&self, target: u32) -> Result<()> {
        self.state.set_sync(target)
    }

    /// Write and read back until the device reports `target`
    ///
    /// On [`VcpError::NotConverged`] the cache holds what the device last
    /// reported, or the value from before the call if no read-back succeeded;
    /// never an unconfirmed `target`.
    pub fn set_checked(&self, target: u32) -> Result<u32> {
        self.state.set_checked(target)
    }

    /// Publish `target` as requested and drive it to the device in the background
    ///
    /// Returns immediately. If a previous request has not started yet it is
    /// dropped; a request already on the bus finishes first. Failures are
    /// logged, and once the request is withdrawn the confirmed value is
    /// published again so observers stop showing `target`.
    pub fn set_async(&self, target: u32) {
        let previous = self.state.requested().replace(target);
        if previous != Some(target) {
            self.state.publish(ChangedValue::Requested(target));
        }

        let state = Arc::clone(&self.state);
        self.worker.submit(move || {
            let result = state.set_checked(target);
            if let Err(err) = &result {
                warn!(property = %state.label(), "async write of {} failed: {}", target, err);
            }
            let cleared = {
                let mut requested = state.requested();
                let cleared = *requested == Some(target);
                if cleared {
                    *requested = None;
                }
                cleared
            };
            // observers last saw Requested(target); point them back at the device
            if cleared && result.is_err() {
                let value = state.value.load(Ordering::Acquire);
                state.publish(ChangedValue::Value(value));
            }
        });
    }

    /// Queue a background [`LevelControl::get`]
    pub fn refresh_async(&self) {
        let state = Arc::clone(&self.state);
        self.worker.submit(move || {
            if let Err(err) = state.get() {
                debug!(property = %state.label(), "background refresh failed: {}", err);
            }
        });
    }

    pub fn set_to_min(&self) -> Result<u32> {
        self.ensure_reading()?;
        self.set_checked(self.min())
    }

    pub fn set_to_max(&self) -> Result<u32> {
        self.ensure_reading()?;
        self.set_checked(self.max())
    }

    /// Block until no async job is running or queued
    pub fn wait_idle(&self) {
        self.worker.wait_idle();
    }

    fn ensure_reading(&self) -> Result<()> {
        if !self.has_reading() {
            self.get()?;
        }
        Ok(())
    }
}

impl LevelState {
    fn label(&self) -> &str {
        self.accessor.label()
    }

    fn requested(&self) -> std::sync::MutexGuard<'_, Option<u32>> {
        self.requested.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, value: ChangedValue) {
        self.observer
            .publish(VcpChange::new(self.accessor.label(), value));
    }

    /// Store `new`, publishing if it changed or `force` is set
    fn store(&self, field: &AtomicU32, new: u32, force: bool, change: fn(u32) -> ChangedValue) {
        let old = field.swap(new, Ordering::AcqRel);
        if force || old != new {
            self.publish(change(new));
        }
    }

    fn get(&self) -> Result<VcpReading> {
        let reading = self.accessor.read()?;
        let first = !self.has_reading.load(Ordering::Acquire);

        self.store(&self.min, reading.min, first, ChangedValue::Min);
        self.store(&self.max, reading.max, first, ChangedValue::Max);
        self.store(&self.value, reading.value, first, ChangedValue::Value);
        self.has_reading.store(true, Ordering::Release);
        Ok(reading)
    }

    fn set_sync(&self, target: u32) -> Result<()> {
        self.accessor.write(target)?;
        self.store(&self.value, target, false, ChangedValue::Value);
        Ok(())
    }

    fn set_checked(&self, target: u32) -> Result<u32> {
        let attempts = self.verify_attempts;
        let before = self.value.load(Ordering::Acquire);
        let mut confirmed: Option<VcpReading> = None;

        for attempt in 1..=attempts {
            if let Err(err) = self.set_sync(target) {
                debug!(property = %self.label(), "checked write {} attempt {}: {}", target, attempt, err);
            }
            match self.get() {
                Ok(reading) if reading.value == target => return Ok(target),
                Ok(reading) => {
                    debug!(
                        property = %self.label(),
                        "device reports {} after writing {} (attempt {})",
                        reading.value, target, attempt
                    );
                    confirmed = Some(reading);
                }
                Err(err) => {
                    debug!(property = %self.label(), "read-back attempt {}: {}", attempt, err);
                }
            }
        }

        // the last optimistic store was never confirmed
        let actual = confirmed.map_or(before, |reading| reading.value);
        self.store(&self.value, actual, false, ChangedValue::Value);
        warn!(
            property = %self.label(),
            "gave up on {} after {} attempt(s), device at {}", target, attempts, actual
        );
        Err(VcpError::NotConverged {
            property: self.label().to_string(),
            target,
            actual,
            attempts,
        })
    }
}

impl std::fmt::Debug for LevelControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelControl")
            .field("label", &self.label())
            .field("min", &self.min())
            .field("value", &self.value())
            .field("max", &self.max())
            .field("requested", &self.requested())
            .finish()
    }
}
