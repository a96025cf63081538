// SPDX-License-Identifier: GPL-3.0-only
//! Transport seam between controls and the physical control bus
//!
//! [`VcpDevice`] is a raw monitor handle addressed by VCP feature code.
//! [`VcpTransport`] is what a single control sees: one get/set pair addressed
//! by component index. [`FeatureTransport`] maps one onto the other.

#[cfg(feature = "ddc-ci")]
pub mod ddc_ci;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

/// Standard MCCS feature codes used by the controls
pub mod codes {
    pub const BRIGHTNESS: u8 = 0x10;
    pub const CONTRAST: u8 = 0x12;
    pub const GAIN: [u8; 3] = [0x16, 0x18, 0x1A];
    pub const DRIVE: [u8; 3] = [0x6C, 0x6E, 0x70];
    pub const POWER_MODE: u8 = 0xD6;
    /// Vendor-specific power control (Dell)
    pub const ALT_POWER: u8 = 0xE1;
}

/// One successful read of a continuous control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VcpReading {
    pub min: u32,
    pub value: u32,
    pub max: u32,
}

impl VcpReading {
    pub fn new(min: u32, value: u32, max: u32) -> Self {
        Self { min, value, max }
    }
}

/// Get/set pair for one control, parameterised by component index
///
/// Calls are synchronous and may fail transiently; callers retry.
pub trait VcpTransport: Send + Sync {
    fn read(&self, component: usize) -> Result<VcpReading>;

    fn write(&self, component: usize, value: u32) -> Result<()>;
}

/// Raw monitor handle
pub trait VcpDevice: std::fmt::Debug + Send + Sync {
    /// Stable identifier for this display
    fn id(&self) -> String;

    /// Human-readable model name
    fn name(&self) -> String;

    /// Three-letter EDID manufacturer id, e.g. `DEL`
    fn manufacturer_id(&self) -> Option<String>;

    fn get_feature(&self, code: u8) -> Result<VcpReading>;

    fn set_feature(&self, code: u8, value: u16) -> Result<()>;
}

/// Routes component `i` of a control to the `i`-th feature code of a device
#[derive(Debug, Clone)]
pub struct FeatureTransport {
    device: Arc<dyn VcpDevice>,
    codes: Vec<u8>,
}

impl FeatureTransport {
    pub fn new(device: Arc<dyn VcpDevice>, codes: &[u8]) -> Self {
        Self {
            device,
            codes: codes.to_vec(),
        }
    }

    pub fn single(device: Arc<dyn VcpDevice>, code: u8) -> Self {
        Self::new(device, &[code])
    }

    fn code(&self, component: usize) -> Result<u8> {
        self.codes
            .get(component)
            .copied()
            .ok_or_else(|| anyhow!("no feature code for component {component}"))
    }
}

impl VcpTransport for FeatureTransport {
    fn read(&self, component: usize) -> Result<VcpReading> {
        let code = self.code(component)?;
        self.device.get_feature(code)
    }

    fn write(&self, component: usize, value: u32) -> Result<()> {
        let code = self.code(component)?;
        let value = u16::try_from(value)
            .with_context(|| format!("value {value} out of range for feature {code:#04x}"))?;
        self.device.set_feature(code, value)
    }
}
