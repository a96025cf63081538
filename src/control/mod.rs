// SPDX-License-Identifier: GPL-3.0-only
//! Observable VCP controls
//!
//! - [`LevelControl`]: one continuous value (brightness, contrast, a colour channel)
//! - [`ChannelGroup`]: red/green/blue levels sharing one transport
//! - [`PowerControl`]: on/off with a vendor-selected command encoding

mod channels;
mod level;
mod power;

pub use channels::{Channel, ChannelGroup};
pub use level::LevelControl;
pub use power::PowerControl;

use std::sync::Arc;

use crate::bus::{BusLock, RetryPolicy};
use crate::config::{Config, DEFAULT_ATTEMPTS};
use crate::observer::{NullObserver, Observable};

/// Everything controls on one bus have in common
#[derive(Clone)]
pub struct ControlContext {
    pub bus: BusLock,
    pub policy: RetryPolicy,
    /// Write/read-back rounds for checked writes
    pub verify_attempts: u32,
    pub observer: Arc<dyn Observable>,
}

impl ControlContext {
    /// Controls on the process-wide bus
    pub fn new(config: &Config, observer: Arc<dyn Observable>) -> Self {
        Self {
            bus: BusLock::global(),
            policy: RetryPolicy::from_config(config),
            verify_attempts: config.verify_attempts.max(1),
            observer,
        }
    }

    pub fn with_bus(mut self, bus: BusLock) -> Self {
        self.bus = bus;
        self
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self {
            bus: BusLock::global(),
            policy: RetryPolicy::default(),
            verify_attempts: DEFAULT_ATTEMPTS,
            observer: Arc::new(NullObserver),
        }
    }
}

impl std::fmt::Debug for ControlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlContext")
            .field("bus", &self.bus)
            .field("policy", &self.policy)
            .field("verify_attempts", &self.verify_attempts)
            .finish_non_exhaustive()
    }
}
