// SPDX-License-Identifier: GPL-3.0-only
//! Dell monitors

use crate::devices::PowerEncoding;
use crate::protocols::codes;

/// EDID manufacturer id
pub const MANUFACTURER_ID: &str = "DEL";

/// Dell drives power through vendor code 0xE1: 0 = on, 1 = off
pub const POWER: PowerEncoding = PowerEncoding {
    code: codes::ALT_POWER,
    on: 0,
    off: 1,
};
