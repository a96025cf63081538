// SPDX-License-Identifier: GPL-3.0-only
//! DDC/CI (Display Data Channel Command Interface) backend
//!
//! DDC/CI carries MCCS VCP commands over the video cable's I2C bus. The
//! controls above this layer serialise and retry every call, so this type
//! only maps feature codes onto `ddc-hi`.

use std::sync::Mutex;

use anyhow::{Result, anyhow};
use ddc_hi::{Ddc, Display};

use super::{VcpDevice, VcpReading};

/// DDC/CI display implementation
pub struct DdcCiDisplay {
    display: Mutex<Display>,
    id: String,
    name: String,
    manufacturer_id: Option<String>,
}

impl DdcCiDisplay {
    pub fn new(display: Display) -> Self {
        let id = match display.info.serial_number.as_deref() {
            Some(serial) if !serial.trim().is_empty() => format!("ddc-{}", serial.trim()),
            // I2C-based id, unstable across reboots
            _ => display.info.id.clone(),
        };
        let name = display.info.model_name.clone().unwrap_or_default();
        let manufacturer_id = display.info.manufacturer_id.clone();

        Self {
            display: Mutex::new(display),
            id,
            name,
            manufacturer_id,
        }
    }

    /// Enumerate all DDC/CI displays
    pub fn enumerate() -> Vec<Self> {
        Display::enumerate().into_iter().map(Self::new).collect()
    }

    fn with_display<T>(&self, f: impl FnOnce(&mut Display) -> Result<T>) -> Result<T> {
        let mut display = self
            .display
            .lock()
            .map_err(|e| anyhow!("DDC display lock poisoned: {e}"))?;
        f(&mut display)
    }
}

impl VcpDevice for DdcCiDisplay {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn manufacturer_id(&self) -> Option<String> {
        self.manufacturer_id.clone()
    }

    fn get_feature(&self, code: u8) -> Result<VcpReading> {
        let value = self.with_display(|display| Ok(display.handle.get_vcp_feature(code)?))?;
        // MCCS continuous controls have an implicit minimum of zero
        Ok(VcpReading::new(
            0,
            u32::from(value.value()),
            u32::from(value.maximum()),
        ))
    }

    fn set_feature(&self, code: u8, value: u16) -> Result<()> {
        self.with_display(|display| {
            display.handle.set_vcp_feature(code, value)?;
            Ok(())
        })
    }
}

impl std::fmt::Debug for DdcCiDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DdcCiDisplay(id: {}, name: {})", self.id, self.name)
    }
}
