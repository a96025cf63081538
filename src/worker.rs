// SPDX-License-Identifier: GPL-3.0-only
//! Lossy single-slot background worker
//!
//! A [`LossyWorker`] owns one thread that runs at most one job at a time and
//! keeps at most one job waiting. Submitting while a job is waiting replaces
//! it, so a burst of submissions runs the in-flight job (uninterrupted) and
//! then only the latest one.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Mailbox {
    next: Option<Job>,
    busy: bool,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    mailbox: Mutex<Mailbox>,
    /// Signalled when a job is posted or shutdown is requested
    wake: Condvar,
    /// Signalled when the worker runs out of work
    idle: Condvar,
}

impl Shared {
    fn mailbox(&self) -> MutexGuard<'_, Mailbox> {
        // Jobs run outside the lock, so poisoning can only come from our own
        // bookkeeping and the mailbox stays consistent
        self.mailbox.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct LossyWorker {
    name: String,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl LossyWorker {
    /// Start the worker thread
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let shared = Arc::new(Shared::default());

        let handle = std::thread::Builder::new()
            .name(format!("vcp:{name}"))
            .spawn({
                let shared = Arc::clone(&shared);
                let name = name.clone();
                move || run(&name, &shared)
            })?;

        Ok(Self {
            name,
            shared,
            handle: Some(handle),
        })
    }

    /// Queue `job`, displacing any job that has not started yet
    ///
    /// Returns `true` if a waiting job was dropped.
    pub fn submit<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut mailbox = self.shared.mailbox();
        let displaced = mailbox.next.replace(Box::new(job)).is_some();
        drop(mailbox);
        self.shared.wake.notify_one();

        if displaced {
            trace!(worker = %self.name, "superseded a queued job");
        }
        displaced
    }

    /// No job running and none queued
    pub fn is_idle(&self) -> bool {
        let mailbox = self.shared.mailbox();
        !mailbox.busy && mailbox.next.is_none()
    }

    /// Block until the worker has nothing left to do
    pub fn wait_idle(&self) {
        let mailbox = self.shared.mailbox();
        let _mailbox = self
            .shared
            .idle
            .wait_while(mailbox, |m| m.busy || m.next.is_some())
            .unwrap_or_else(|e| e.into_inner());
    }
}

fn run(name: &str, shared: &Shared) {
    loop {
        let job = {
            let mailbox = shared.mailbox();
            let mut mailbox = shared
                .wake
                .wait_while(mailbox, |m| m.next.is_none() && !m.shutdown)
                .unwrap_or_else(|e| e.into_inner());

            match mailbox.next.take() {
                Some(job) => {
                    mailbox.busy = true;
                    job
                }
                None => break,
            }
        };

        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker = %name, "job panicked");
        }

        let mut mailbox = shared.mailbox();
        mailbox.busy = false;
        if mailbox.next.is_none() {
            shared.idle.notify_all();
        }
    }

    debug!(worker = %name, "worker stopped");
}

impl Drop for LossyWorker {
    fn drop(&mut self) {
        self.shared.mailbox().shutdown = true;
        self.shared.wake.notify_one();

        if let Some(handle) = self.handle.take() {
            // A job that owns the last handle to its worker must not join itself
            if handle.thread().id() == std::thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!(worker = %self.name, "worker thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for LossyWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LossyWorker")
            .field("name", &self.name)
            .field("idle", &self.is_idle())
            .finish()
    }
}
