// SPDX-License-Identifier: GPL-3.0-only
//! Vendor-specific quirks, organised by manufacturer

pub mod dell;

use crate::config::Config;
use crate::protocols::codes;

/// How a monitor encodes power on/off as a VCP write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerEncoding {
    /// VCP feature code carrying the power state
    pub code: u8,
    /// Value written (and read back) for "on"
    pub on: u16,
    /// Value written for "off"
    pub off: u16,
}

impl PowerEncoding {
    pub fn encode(&self, on: bool) -> u16 {
        if on { self.on } else { self.off }
    }

    /// Anything other than the "on" value (standby, suspend, off) counts as off
    pub fn decode(&self, value: u32) -> bool {
        value == u32::from(self.on)
    }
}

/// MCCS power mode: 1 = on, 4 = off
pub const STANDARD_POWER: PowerEncoding = PowerEncoding {
    code: codes::POWER_MODE,
    on: 1,
    off: 4,
};

/// Pick the power encoding for a manufacturer
pub fn power_encoding(manufacturer_id: Option<&str>, config: &Config) -> PowerEncoding {
    if config.uses_alternate_power(manufacturer_id) {
        dell::POWER
    } else {
        STANDARD_POWER
    }
}
