// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cancellable deferred task
//!
//! A single worker thread sleeps on a condition variable until a deadline
//! is armed. Re-arming moves the deadline; only the most recent `schedule`
//! fires. The action runs with the timer's lock released so it may take
//! other locks (or call back into `schedule`) without deadlocking.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<TimerState>,
    cv: Condvar,
}

/// Debounced one-shot action on a dedicated thread
pub struct DebounceTimer {
    name: String,
    delay: Duration,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    /// Spawn the worker; `action` runs each time an armed deadline passes
    pub fn spawn<F>(name: impl Into<String>, delay: Duration, mut action: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name = name.into();
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let thread_name = name.clone();

        let worker = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut state = worker_shared.state.lock();
                loop {
                    if state.shutdown {
                        break;
                    }
                    match state.deadline {
                        None => worker_shared.cv.wait(&mut state),
                        Some(deadline) if Instant::now() >= deadline => {
                            state.deadline = None;
                            trace!("[TIMER] {} fired", thread_name);
                            MutexGuard::unlocked(&mut state, &mut action);
                        }
                        Some(deadline) => {
                            worker_shared.cv.wait_until(&mut state, deadline);
                        }
                    }
                }
                debug!("[TIMER] {} worker exited", thread_name);
            })?;

        Ok(Self {
            name,
            delay,
            shared,
            worker: Some(worker),
        })
    }

    /// Arm (or re-arm) the deadline at now + delay
    pub fn schedule(&self) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }
        state.deadline = Some(Instant::now() + self.delay);
        self.shared.cv.notify_one();
    }

    /// Disarm without firing
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        if state.deadline.take().is_some() {
            self.shared.cv.notify_one();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }

    /// Stop the worker; pending deadlines are dropped and later schedules ignored
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        if !state.shutdown {
            state.shutdown = true;
            state.deadline = None;
            self.shared.cv.notify_one();
            debug!("[TIMER] {} shutting down", self.name);
        }
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
