// SPDX-License-Identifier: GPL-3.0-only
//! Discover displays and attach them to a registry

use std::sync::Arc;

use crate::config::Config;
use crate::control::ControlContext;
use crate::protocols::VcpDevice;

use super::manager::VcpRegistry;
use super::vcp::{DisplayId, MonitorVcp};

/// All DDC/CI displays the system exposes
#[cfg(feature = "ddc-ci")]
pub fn enumerate_ddc() -> Vec<Arc<dyn VcpDevice>> {
    use crate::protocols::ddc_ci::DdcCiDisplay;

    let displays = DdcCiDisplay::enumerate();
    info!("Found {} DDC/CI display(s)", displays.len());

    displays
        .into_iter()
        .map(|ddc_display| {
            let id = ddc_display.id();
            if !id.starts_with("ddc-") {
                warn!(
                    "DDC/CI display '{}' has no EDID serial, using unstable id {}",
                    ddc_display.name(),
                    id
                );
            }
            Arc::new(ddc_display) as Arc<dyn VcpDevice>
        })
        .collect()
}

/// Attach every device to `registry` and prune the ones that disappeared
///
/// Devices that fail to attach are logged and skipped.
pub fn attach_all(
    registry: &VcpRegistry,
    devices: Vec<Arc<dyn VcpDevice>>,
    ctx: &ControlContext,
    config: &Config,
) -> Vec<Arc<MonitorVcp>> {
    let present: Vec<DisplayId> = devices.iter().map(|d| d.id()).collect();
    registry.retain(&present);

    let mut attached = Vec::with_capacity(devices.len());
    for device in devices {
        let id = device.id();
        match registry.get_or_attach(device, ctx, config) {
            Ok(monitor) => attached.push(monitor),
            Err(err) => error!(display_id = %id, "Failed to attach display: {}", err),
        }
    }
    attached
}
