// SPDX-License-Identifier: GPL-3.0-only
//! Monitor power on/off

use std::sync::{Arc, Mutex};

use crate::bus::RetryableAccessor;
use crate::control::ControlContext;
use crate::devices::PowerEncoding;
use crate::error::Result;
use crate::observer::{ChangedValue, Observable, VcpChange};
use crate::protocols::VcpTransport;

/// Boolean power control
///
/// Writes go through the retried, bus-locked accessor but are not verified by
/// reading back: many monitors stop answering once they are off.
pub struct PowerControl {
    accessor: RetryableAccessor,
    encoding: PowerEncoding,
    observer: Arc<dyn Observable>,
    state: Mutex<Option<bool>>,
}

impl PowerControl {
    /// `transport` component 0 must carry `encoding.code`
    pub fn new(
        ctx: &ControlContext,
        label: impl Into<Arc<str>>,
        transport: Arc<dyn VcpTransport>,
        encoding: PowerEncoding,
    ) -> Self {
        Self {
            accessor: RetryableAccessor::new(label.into(), transport, 0, ctx.bus.clone(), ctx.policy),
            encoding,
            observer: Arc::clone(&ctx.observer),
            state: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        self.accessor.label()
    }

    pub fn encoding(&self) -> PowerEncoding {
        self.encoding
    }

    /// Last confirmed state, `None` until a read or write succeeded
    pub fn is_on(&self) -> Option<bool> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the power state from the device
    pub fn get(&self) -> Result<bool> {
        let reading = self.accessor.read()?;
        let on = self.encoding.decode(reading.value);
        self.store(on);
        Ok(on)
    }

    pub fn set(&self, on: bool) -> Result<()> {
        self.accessor.write(u32::from(self.encoding.encode(on)))?;
        info!(property = %self.label(), "power {}", if on { "on" } else { "off" });
        self.store(on);
        Ok(())
    }

    fn store(&self, on: bool) {
        let previous = self
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(on);
        if previous != Some(on) {
            self.observer
                .publish(VcpChange::new(self.accessor.label(), ChangedValue::Power(on)));
        }
    }
}

impl std::fmt::Debug for PowerControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerControl")
            .field("label", &self.label())
            .field("encoding", &self.encoding)
            .field("on", &self.is_on())
            .finish()
    }
}
