// SPDX-License-Identifier: GPL-3.0-only
//! Registry of attached monitors
//!
//! Each physical display gets exactly one [`MonitorVcp`] for its lifetime, so
//! its controls (and their workers and caches) are shared by everyone who
//! asks for that display.
//!
//! # Thread Safety
//!
//! The map sits behind an `RwLock`; lookups take the read lock, attaching and
//! pruning take the write lock. Bus traffic never happens under this lock
//! except for the background refresh queued on attach, which runs on the
//! controls' own workers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::control::ControlContext;
use crate::error::Result;
use crate::protocols::VcpDevice;

use super::vcp::{DisplayId, MonitorVcp};

type MonitorMap = HashMap<DisplayId, Arc<MonitorVcp>>;

/// Process-wide registry instance
static GLOBAL_REGISTRY: Lazy<Arc<RwLock<MonitorMap>>> =
    Lazy::new(|| Arc::new(RwLock::new(HashMap::new())));

#[derive(Clone, Default)]
pub struct VcpRegistry {
    monitors: Arc<RwLock<MonitorMap>>,
}

impl VcpRegistry {
    /// A registry of its own, not shared with [`VcpRegistry::shared`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the process-wide registry
    pub fn shared() -> Self {
        Self {
            monitors: Arc::clone(&GLOBAL_REGISTRY),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MonitorMap> {
        self.monitors.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MonitorMap> {
        self.monitors.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Controls for `device`, creating them on first sight
    pub fn get_or_attach(
        &self,
        device: Arc<dyn VcpDevice>,
        ctx: &ControlContext,
        config: &Config,
    ) -> Result<Arc<MonitorVcp>> {
        let id = device.id();
        if let Some(existing) = self.get(&id) {
            return Ok(existing);
        }

        let mut monitors = self.write();
        // Another thread may have attached it while we waited for the lock
        if let Some(existing) = monitors.get(&id) {
            return Ok(Arc::clone(existing));
        }

        let monitor = Arc::new(MonitorVcp::new(device, ctx, config)?);
        info!("Display {} ({}) attached", id, monitor.name());
        monitors.insert(id, Arc::clone(&monitor));
        Ok(monitor)
    }

    pub fn get(&self, id: &str) -> Option<Arc<MonitorVcp>> {
        self.read().get(id).cloned()
    }

    /// All attached monitors, sorted by id
    pub fn monitors(&self) -> Vec<Arc<MonitorVcp>> {
        let mut monitors: Vec<_> = self.read().values().cloned().collect();
        monitors.sort_by_key(|m| m.id());
        monitors
    }

    pub fn ids(&self) -> Vec<DisplayId> {
        let mut ids: Vec<_> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Drop monitors whose id is not in `present`
    pub fn retain(&self, present: &[DisplayId]) {
        self.write().retain(|id, _| {
            let keep = present.contains(id);
            if !keep {
                info!("Display {} removed from registry", id);
            }
            keep
        });
    }

    pub fn remove(&self, id: &str) -> Option<Arc<MonitorVcp>> {
        self.write().remove(id)
    }
}

impl std::fmt::Debug for VcpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcpRegistry").field("ids", &self.ids()).finish()
    }
}
