// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Idle suspension of the backend container
//!
//! The backend is paused a quiet interval after the last exchange and
//! resumed right before the next one. The guarded resource (the RPC
//! channel), the running flag and the activity timestamp share one mutex
//! with the background timer, so a pause can never overlap a resume or an
//! exchange in flight.
//!
//! Pause and resume are idempotent. A failing primitive (container already
//! gone, paused by another session) is logged and the flag rolled back; the
//! caller's exchange proceeds regardless.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sailsim_config::SuspensionConfig;
use tracing::{debug, info, trace, warn};

use crate::error::SessionResult;
use crate::runtime::{ContainerHandle, ContainerRuntime, RuntimeError};
use crate::timer::DebounceTimer;

/// Counters for the pause/resume machinery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuspensionStats {
    /// Successful unpause calls
    pub resumes: u64,
    /// Successful pause calls, the initial one included
    pub pauses: u64,
    /// Times the idle timer was (re-)armed
    pub schedules: u64,
    /// Times the idle timer expired
    pub fired: u64,
}

struct Control {
    runtime: Arc<dyn ContainerRuntime>,
    container: ContainerHandle,
}

struct Guarded<T> {
    resource: T,
    is_running: bool,
    last_activity: Option<Instant>,
    stats: SuspensionStats,
}

impl<T> Guarded<T> {
    fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }

    fn resume(&mut self, control: &Control) {
        if self.is_running {
            trace!("[SUSPEND] {} already running", control.container.name);
            return;
        }
        self.is_running = true;
        match control.runtime.unpause(&control.container) {
            Ok(()) => {
                self.stats.resumes += 1;
                debug!("[SUSPEND] Resumed {}", control.container.name);
            }
            Err(e) => {
                self.is_running = false;
                warn!("[SUSPEND] Failed to resume {}: {}", control.container.name, e);
            }
        }
    }

    fn pause(&mut self, control: &Control) {
        if !self.is_running {
            trace!("[SUSPEND] {} already paused", control.container.name);
            return;
        }
        self.is_running = false;
        match control.runtime.pause(&control.container) {
            Ok(()) => {
                self.stats.pauses += 1;
                debug!("[SUSPEND] Paused {}", control.container.name);
            }
            Err(e) => {
                self.is_running = true;
                warn!("[SUSPEND] Failed to pause {}: {}", control.container.name, e);
            }
        }
    }
}

/// Wraps a resource so every use resumes the backend and arms an idle pause
pub struct IdleSuspensionManager<T: Send + 'static> {
    // Joined first on drop, before the guarded resource goes away
    timer: Option<DebounceTimer>,
    inner: Arc<Mutex<Guarded<T>>>,
    control: Arc<Control>,
}

impl<T: Send + 'static> IdleSuspensionManager<T> {
    /// `is_running` is the container's state as observed at acquisition
    pub fn new(
        resource: T,
        runtime: Arc<dyn ContainerRuntime>,
        container: ContainerHandle,
        is_running: bool,
        config: &SuspensionConfig,
    ) -> SessionResult<Self> {
        let idle_delay = config.idle_delay();
        let inner = Arc::new(Mutex::new(Guarded {
            resource,
            is_running,
            last_activity: None,
            stats: SuspensionStats::default(),
        }));
        let control = Arc::new(Control { runtime, container });

        let timer = if config.enabled {
            let weak = Arc::downgrade(&inner);
            let timer_control = Arc::clone(&control);
            let timer = DebounceTimer::spawn(
                format!("sailsim-idle-{}", control.container.name),
                idle_delay,
                move || pause_if_idle(&weak, &timer_control, idle_delay),
            )
            .map_err(RuntimeError::Io)?;
            Some(timer)
        } else {
            info!(
                "[SUSPEND] Idle suspension disabled for {}",
                control.container.name
            );
            None
        };

        Ok(Self {
            timer,
            inner,
            control,
        })
    }

    /// Run `f` on the resource with the backend resumed, then arm the idle pause
    ///
    /// The lock is held for the whole exchange, so the timer cannot pause the
    /// backend between the resume and the reply.
    pub fn with_active<R>(&self, f: impl FnOnce(&mut T) -> SessionResult<R>) -> SessionResult<R> {
        let mut guarded = self.inner.lock();
        guarded.resume(&self.control);
        guarded.touch();

        let result = f(&mut guarded.resource);

        guarded.touch();
        if let Some(timer) = &self.timer {
            timer.schedule();
            guarded.stats.schedules += 1;
        }
        result
    }

    /// Pause immediately, dropping any pending idle pause
    pub fn pause_now(&self) {
        let mut guarded = self.inner.lock();
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
        guarded.pause(&self.control);
    }

    /// Resume immediately without running an exchange
    pub fn resume_now(&self) {
        self.inner.lock().resume(&self.control);
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running
    }

    pub fn stats(&self) -> SuspensionStats {
        self.inner.lock().stats
    }

    pub fn container(&self) -> &ContainerHandle {
        &self.control.container
    }

    /// Stop the background timer; later exchanges no longer arm a pause
    pub fn shutdown_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.shutdown();
        }
    }
}

fn pause_if_idle<T>(inner: &Weak<Mutex<Guarded<T>>>, control: &Control, idle_delay: Duration) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut guarded = inner.lock();
    guarded.stats.fired += 1;

    // A newer exchange may have finished while we waited for the lock
    let idle = guarded
        .last_activity
        .map_or(true, |at| at.elapsed() >= idle_delay);
    if idle {
        debug!(
            "[SUSPEND] {} unused for {:?}, pausing",
            control.container.name, idle_delay
        );
        guarded.pause(control);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::runtime::{ContainerInfo, LaunchSpec, RuntimeResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingRuntime {
        pauses: AtomicUsize,
        unpauses: AtomicUsize,
        fail_pause: AtomicBool,
        fail_unpause: AtomicBool,
    }

    impl ContainerRuntime for CountingRuntime {
        fn get(&self, _name: &str) -> RuntimeResult<Option<ContainerInfo>> {
            Ok(None)
        }
        fn run(&self, _spec: &LaunchSpec) -> RuntimeResult<ContainerHandle> {
            Err(RuntimeError::Api("not supported".to_string()))
        }
        fn pause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
            if self.fail_pause.load(Ordering::SeqCst) {
                return Err(RuntimeError::NotFound(container.name.clone()));
            }
            self.pauses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn unpause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
            if self.fail_unpause.load(Ordering::SeqCst) {
                return Err(RuntimeError::NotFound(container.name.clone()));
            }
            self.unpauses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn kill(&self, _container: &ContainerHandle) -> RuntimeResult<()> {
            Ok(())
        }
        fn logs(&self, _container: &ContainerHandle) -> RuntimeResult<String> {
            Ok(String::new())
        }
    }

    fn manager(
        delay_ms: u64,
        enabled: bool,
    ) -> (IdleSuspensionManager<Vec<u32>>, Arc<CountingRuntime>) {
        let runtime = Arc::new(CountingRuntime::default());
        let config = SuspensionConfig {
            enabled,
            idle_delay_ms: delay_ms,
        };
        let handle = ContainerHandle {
            id: "abc".to_string(),
            name: "sim".to_string(),
        };
        let manager =
            IdleSuspensionManager::new(Vec::new(), runtime.clone(), handle, true, &config).unwrap();
        (manager, runtime)
    }

    #[test]
    fn test_resume_and_pause_are_idempotent() {
        let (manager, runtime) = manager(1000, true);
        manager.pause_now();
        manager.pause_now();
        assert_eq!(runtime.pauses.load(Ordering::SeqCst), 1);
        assert!(!manager.is_running());

        manager.resume_now();
        manager.resume_now();
        assert_eq!(runtime.unpauses.load(Ordering::SeqCst), 1);
        assert!(manager.is_running());
    }

    #[test]
    fn test_burst_resumes_once_and_pauses_once() {
        let (manager, runtime) = manager(60, true);
        manager.pause_now();

        for i in 0..5 {
            manager
                .with_active(|log| {
                    log.push(i);
                    Ok(())
                })
                .unwrap();
        }
        let stats = manager.stats();
        assert_eq!(stats.resumes, 1);
        assert_eq!(stats.schedules, 5);
        assert!(manager.is_running());

        thread::sleep(Duration::from_millis(400));
        assert!(!manager.is_running());
        assert_eq!(runtime.pauses.load(Ordering::SeqCst), 2);
        assert_eq!(manager.stats().pauses, 2);
        manager
            .with_active(|log| {
                assert_eq!(log.len(), 5);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_failed_pause_rolls_back() {
        let (manager, runtime) = manager(1000, true);
        runtime.fail_pause.store(true, Ordering::SeqCst);
        manager.pause_now();
        assert!(manager.is_running());
        assert_eq!(manager.stats().pauses, 0);
    }

    #[test]
    fn test_failed_resume_rolls_back_and_exchange_runs() {
        let (manager, runtime) = manager(1000, true);
        manager.pause_now();
        runtime.fail_unpause.store(true, Ordering::SeqCst);

        let len = manager
            .with_active(|log| {
                log.push(7);
                Ok(log.len())
            })
            .unwrap();
        assert_eq!(len, 1);
        assert!(!manager.is_running());
        assert_eq!(manager.stats().resumes, 0);
        assert_eq!(runtime.unpauses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_idle_timer_waits_for_slow_exchange() {
        let (manager, runtime) = manager(30, true);
        manager.pause_now();

        // Arms the timer so it expires halfway through the next exchange
        manager.with_active(|_| Ok(())).unwrap();
        manager
            .with_active(|_| {
                thread::sleep(Duration::from_millis(200));
                assert_eq!(runtime.pauses.load(Ordering::SeqCst), 1);
                Ok(())
            })
            .unwrap();
        assert!(manager.is_running());
        assert_eq!(runtime.pauses.load(Ordering::SeqCst), 1);

        thread::sleep(Duration::from_millis(300));
        assert!(!manager.is_running());
        assert_eq!(runtime.pauses.load(Ordering::SeqCst), 2);
        assert!(manager.stats().fired >= 2);
    }

    #[test]
    fn test_error_from_exchange_still_arms_pause() {
        let (manager, _runtime) = manager(1000, true);
        let result: SessionResult<()> =
            manager.with_active(|_| Err(SessionError::Backend("boom".to_string())));
        assert!(matches!(result, Err(SessionError::Backend(_))));
        assert_eq!(manager.stats().schedules, 1);
    }

    #[test]
    fn test_disabled_never_schedules() {
        let (manager, runtime) = manager(10, false);
        manager.with_active(|_| Ok(())).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(manager.stats().schedules, 0);
        assert!(manager.is_running());
        assert_eq!(runtime.pauses.load(Ordering::SeqCst), 0);
    }
}
