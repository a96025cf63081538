// SPDX-License-Identifier: GPL-3.0-only
mod enumeration;
mod manager;
mod vcp;

#[cfg(feature = "ddc-ci")]
pub use enumeration::enumerate_ddc;
pub use enumeration::attach_all;
pub use manager::VcpRegistry;
pub use vcp::{DisplayId, MonitorVcp, VcpProperty};
