// SPDX-License-Identifier: GPL-3.0-only
//! Bursts of asynchronous writes only drive the latest target

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::GatedTransport;
use monitor_vcp::bus::{BusLock, RetryPolicy};
use monitor_vcp::control::{ControlContext, LevelControl};
use monitor_vcp::observer::{BroadcastObserver, ChangedValue};

fn control(transport: Arc<GatedTransport>, observer: BroadcastObserver) -> LevelControl {
    let ctx = ControlContext {
        bus: BusLock::new(),
        policy: RetryPolicy::default(),
        verify_attempts: 10,
        observer: Arc::new(observer),
    };
    LevelControl::new(&ctx, "ddc-X/brightness", transport, 0).unwrap()
}

#[test]
fn superseded_targets_never_reach_the_transport() {
    let transport = Arc::new(GatedTransport::default());
    let control = control(transport.clone(), BroadcastObserver::new(256));
    transport.close();

    control.set_async(1);
    transport.wait_for_write_calls(1);
    for target in 2..=50 {
        control.set_async(target);
    }
    transport.open();
    control.wait_idle();

    // the in-flight job finishes, then only the last request runs
    assert_eq!(transport.writes(), vec![1, 50]);
    assert_eq!(control.value(), 50);
    assert_eq!(control.requested(), None);
}

#[test]
fn requests_are_published_before_the_bus_is_touched() {
    let transport = Arc::new(GatedTransport::default());
    let observer = BroadcastObserver::new(256);
    let mut rx = observer.subscribe();
    let control = control(transport.clone(), observer);
    transport.close();

    control.set_async(42);

    let first = rx.try_recv().unwrap();
    assert_eq!(&*first.property, "ddc-X/brightness");
    assert_eq!(first.value, ChangedValue::Requested(42));
    assert_eq!(control.displayed(), 42);

    transport.open();
    control.wait_idle();

    let mut confirmed = false;
    while let Ok(change) = rx.try_recv() {
        confirmed |= change.value == ChangedValue::Value(42);
    }
    assert!(confirmed);
}

#[test]
fn slow_bus_burst_ends_on_latest_target() {
    let transport = Arc::new(GatedTransport::with_latency(Duration::from_millis(10)));
    let control = control(transport.clone(), BroadcastObserver::new(16));

    for target in 1..=30 {
        control.set_async(target);
    }
    control.wait_idle();

    let writes = transport.writes();
    assert_eq!(writes.last(), Some(&30));
    assert!(writes.windows(2).all(|w| w[0] < w[1]), "out of order: {writes:?}");
    assert_eq!(control.value(), 30);
}
