// SPDX-License-Identifier: GPL-3.0-only
//! VCP (Virtual Control Panel) controls for external monitors
//!
//! Monitor properties such as brightness, contrast, colour gain/drive and
//! power are reached over a slow, exclusive and occasionally flaky control
//! bus. This crate turns the raw get/set primitives of that bus into cached,
//! observable values:
//!
//! - every bus call runs under one process-wide [`bus::BusLock`] and is retried
//!   a bounded number of times ([`bus::RetryableAccessor`])
//! - writes can be verified by reading back ([`control::LevelControl::set_checked`])
//! - bursts of asynchronous writes collapse to the latest target
//!   ([`worker::LossyWorker`])

#[macro_use]
extern crate tracing;

pub mod bus;
pub mod config;
pub mod control;
pub mod devices;
pub mod error;
pub mod monitor;
pub mod observer;
pub mod protocols;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VcpError};
