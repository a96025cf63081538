// SPDX-License-Identifier: GPL-3.0-only
#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use monitor_vcp::protocols::{VcpReading, VcpTransport};

/// Entry/exit of one transport call
#[derive(Debug, Clone)]
pub struct Interval {
    pub device: Arc<str>,
    pub ok: bool,
    pub start: Instant,
    pub end: Instant,
}

/// Log shared by several transports, so overlaps across controls show up
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    intervals: Arc<Mutex<Vec<Interval>>>,
}

impl CallLog {
    pub fn record(&self, interval: Interval) {
        self.intervals.lock().unwrap().push(interval);
    }

    pub fn intervals(&self) -> Vec<Interval> {
        self.intervals.lock().unwrap().clone()
    }

    /// First pair of calls that ran at the same time, if any
    pub fn find_overlap(&self) -> Option<(Interval, Interval)> {
        self.in_order()
            .windows(2)
            .find(|w| w[1].start < w[0].end)
            .map(|w| (w[0].clone(), w[1].clone()))
    }

    /// Calls sorted by start time
    pub fn in_order(&self) -> Vec<Interval> {
        let mut intervals = self.intervals();
        intervals.sort_by_key(|i| i.start);
        intervals
    }
}

/// Device that takes `latency` per call and records when each call ran
///
/// With [`InstrumentedTransport::failing`] every operation fails `n` times
/// before a call gets through, so each retried operation shows up in the log
/// as `n` failed intervals followed by one successful one.
#[derive(Debug)]
pub struct InstrumentedTransport {
    log: CallLog,
    name: Arc<str>,
    latency: Duration,
    failures: u32,
    state: Mutex<Device>,
}

#[derive(Debug)]
struct Device {
    value: u32,
    calls: u32,
}

impl InstrumentedTransport {
    pub fn new(log: CallLog, latency: Duration) -> Self {
        Self::named(log, "device", latency)
    }

    pub fn named(log: CallLog, name: &str, latency: Duration) -> Self {
        Self {
            log,
            name: Arc::from(name),
            latency,
            failures: 0,
            state: Mutex::new(Device { value: 50, calls: 0 }),
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    fn timed<T>(&self, f: impl FnOnce(&mut u32) -> T) -> Result<T> {
        let start = Instant::now();
        std::thread::sleep(self.latency);
        let mut state = self.state.lock().unwrap();
        let call = state.calls;
        state.calls += 1;
        let ok = call % (self.failures + 1) == self.failures;
        let out = ok.then(|| f(&mut state.value));
        drop(state);
        self.log.record(Interval {
            device: Arc::clone(&self.name),
            ok,
            start,
            end: Instant::now(),
        });
        out.ok_or_else(|| anyhow::anyhow!("{}: call {} failed", self.name, call))
    }
}

impl VcpTransport for InstrumentedTransport {
    fn read(&self, _component: usize) -> Result<VcpReading> {
        self.timed(|value| VcpReading::new(0, *value, 100))
    }

    fn write(&self, _component: usize, value: u32) -> Result<()> {
        self.timed(|current| *current = value)
    }
}

/// Echoing device whose writes can be held at a gate
#[derive(Debug, Default)]
pub struct GatedTransport {
    state: Mutex<GateState>,
    signal: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    value: u32,
    closed: bool,
    write_calls: u32,
    writes: Vec<u32>,
    write_latency: Duration,
}

impl GatedTransport {
    pub fn with_latency(latency: Duration) -> Self {
        let transport = Self::default();
        transport.state.lock().unwrap().write_latency = latency;
        transport
    }

    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }

    pub fn open(&self) {
        self.state.lock().unwrap().closed = false;
        self.signal.notify_all();
    }

    pub fn writes(&self) -> Vec<u32> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn wait_for_write_calls(&self, n: u32) {
        let state = self.state.lock().unwrap();
        let (_state, timeout) = self
            .signal
            .wait_timeout_while(state, Duration::from_secs(5), |s| s.write_calls < n)
            .unwrap();
        assert!(!timeout.timed_out(), "write never reached the transport");
    }
}

impl VcpTransport for GatedTransport {
    fn read(&self, _component: usize) -> Result<VcpReading> {
        Ok(VcpReading::new(0, self.state.lock().unwrap().value, 100))
    }

    fn write(&self, _component: usize, value: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        self.signal.notify_all();
        let mut state = self.signal.wait_while(state, |s| s.closed).unwrap();

        let latency = state.write_latency;
        state.value = value;
        state.writes.push(value);
        drop(state);

        std::thread::sleep(latency);
        Ok(())
    }
}
