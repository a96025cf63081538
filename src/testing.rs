// SPDX-License-Identifier: GPL-3.0-only
//! Fakes shared by unit tests

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};

use crate::observer::{ChangedValue, VcpChange};
use crate::protocols::{VcpReading, VcpTransport};

#[derive(Debug)]
struct State {
    readings: Vec<VcpReading>,
    fail_reads: u32,
    reads_before_failure: u32,
    fail_writes: u32,
    read_calls: u32,
    write_calls: u32,
    writes: Vec<(usize, u32)>,
    clamp: bool,
    gate_open: bool,
}

/// Transport that behaves like a device holding one value per component
///
/// Successful writes are applied (clamped to max when `clamp` is set) and
/// reads echo them back.
#[derive(Debug)]
pub struct ScriptedTransport {
    state: Mutex<State>,
    signal: Condvar,
}

impl ScriptedTransport {
    pub fn new(reading: VcpReading) -> Self {
        Self::with_components(reading, 3)
    }

    pub fn with_components(reading: VcpReading, components: usize) -> Self {
        Self {
            state: Mutex::new(State {
                readings: vec![reading; components],
                fail_reads: 0,
                reads_before_failure: 0,
                fail_writes: 0,
                read_calls: 0,
                write_calls: 0,
                writes: Vec::new(),
                clamp: false,
                gate_open: true,
            }),
            signal: Condvar::new(),
        }
    }

    pub fn clamping(self) -> Self {
        self.state.lock().unwrap().clamp = true;
        self
    }

    pub fn fail_next_reads(&self, n: u32) {
        self.state.lock().unwrap().fail_reads = n;
    }

    /// Let `ok` reads through, then fail the next `n`
    pub fn fail_reads_after(&self, ok: u32, n: u32) {
        let mut state = self.state.lock().unwrap();
        state.reads_before_failure = ok;
        state.fail_reads = n;
    }

    pub fn fail_next_writes(&self, n: u32) {
        self.state.lock().unwrap().fail_writes = n;
    }

    pub fn read_calls(&self) -> u32 {
        self.state.lock().unwrap().read_calls
    }

    pub fn write_calls(&self) -> u32 {
        self.state.lock().unwrap().write_calls
    }

    /// Values of successful writes to component 0
    pub fn writes(&self) -> Vec<u32> {
        self.writes_to(0)
    }

    pub fn writes_to(&self, component: usize) -> Vec<u32> {
        self.state
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(c, _)| *c == component)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn device_value(&self, component: usize) -> u32 {
        self.state.lock().unwrap().readings[component].value
    }

    /// Make writes block until [`ScriptedTransport::open_gate`]
    pub fn close_gate(&self) {
        self.state.lock().unwrap().gate_open = false;
    }

    pub fn open_gate(&self) {
        self.state.lock().unwrap().gate_open = true;
        self.signal.notify_all();
    }

    /// Wait until at least `n` write calls have started
    pub fn wait_for_write_calls(&self, n: u32) {
        let state = self.state.lock().unwrap();
        let (state, timeout) = self
            .signal
            .wait_timeout_while(state, Duration::from_secs(5), |s| s.write_calls < n)
            .unwrap();
        assert!(!timeout.timed_out(), "only {} write calls seen", state.write_calls);
    }
}

impl VcpTransport for ScriptedTransport {
    fn read(&self, component: usize) -> Result<VcpReading> {
        let mut state = self.state.lock().unwrap();
        state.read_calls += 1;
        if state.reads_before_failure > 0 {
            state.reads_before_failure -= 1;
        } else if state.fail_reads > 0 {
            state.fail_reads -= 1;
            bail!("scripted read failure");
        }
        Ok(state.readings[component])
    }

    fn write(&self, component: usize, value: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        self.signal.notify_all();
        let mut state = self.signal.wait_while(state, |s| !s.gate_open).unwrap();

        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            bail!("scripted write failure");
        }
        let clamp = state.clamp;
        let reading = &mut state.readings[component];
        reading.value = if clamp { value.min(reading.max) } else { value };
        state.writes.push((component, value));
        Ok(())
    }
}

/// Observer that records every change
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    changes: Arc<Mutex<Vec<VcpChange>>>,
}

impl Recorder {
    pub fn changes(&self) -> Vec<VcpChange> {
        self.changes.lock().unwrap().clone()
    }

    pub fn values(&self) -> Vec<ChangedValue> {
        self.changes().into_iter().map(|c| c.value).collect()
    }

    pub fn clear(&self) {
        self.changes.lock().unwrap().clear();
    }
}

impl crate::observer::Observable for Recorder {
    fn publish(&self, change: VcpChange) {
        self.changes.lock().unwrap().push(change);
    }
}
