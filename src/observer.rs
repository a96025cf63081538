// SPDX-License-Identifier: GPL-3.0-only
//! Change notification
//!
//! Controls publish every confirmed change of their cached state through an
//! [`Observable`]. Publishing is fire-and-forget and happens on whichever
//! thread completed the bus operation, so implementations must not block.

use std::sync::Arc;

use tokio::sync::broadcast;

/// Which cached field changed, and its new value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangedValue {
    /// Confirmed level value
    Value(u32),
    /// Optimistic target of an asynchronous write
    Requested(u32),
    /// Hardware-reported minimum
    Min(u32),
    /// Hardware-reported maximum
    Max(u32),
    /// Power state
    Power(bool),
}

/// A labelled value change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcpChange {
    pub property: Arc<str>,
    pub value: ChangedValue,
}

impl VcpChange {
    pub fn new(property: &Arc<str>, value: ChangedValue) -> Self {
        Self {
            property: Arc::clone(property),
            value,
        }
    }
}

/// Sink for value changes
pub trait Observable: Send + Sync {
    fn publish(&self, change: VcpChange);
}

impl<F> Observable for F
where
    F: Fn(VcpChange) + Send + Sync,
{
    fn publish(&self, change: VcpChange) {
        self(change);
    }
}

/// Discards every change
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observable for NullObserver {
    fn publish(&self, _change: VcpChange) {}
}

/// Logs every change at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observable for LogObserver {
    fn publish(&self, change: VcpChange) {
        debug!(property = %change.property, value = ?change.value, "VCP value changed");
    }
}

/// Fans changes out to any number of receivers over a tokio broadcast channel
///
/// Slow receivers lag and lose old changes instead of blocking the bus thread.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<VcpChange>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VcpChange> {
        self.tx.subscribe()
    }
}

impl Observable for BroadcastObserver {
    fn publish(&self, change: VcpChange) {
        // No receivers is not an error for a fire-and-forget sink
        let _ = self.tx.send(change);
    }
}
