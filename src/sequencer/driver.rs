// Scheduler driver - Background thread running scheduling passes
// The scheduler lock is taken once per step, never for a whole pass

use super::scheduler::StepScheduler;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub(crate) fn lock_scheduler(core: &Mutex<StepScheduler>) -> MutexGuard<'_, StepScheduler> {
    match core.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("Scheduler lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// One scheduling pass with per-step locking; returns the steps scheduled
pub(crate) fn run_pass(core: &Mutex<StepScheduler>) -> usize {
    lock_scheduler(core).begin_pass();
    let mut scheduled = 0;
    while lock_scheduler(core).schedule_next_due_step() {
        scheduled += 1;
    }
    lock_scheduler(core).end_pass();
    scheduled
}

pub(crate) struct SchedulerDriver {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SchedulerDriver {
    pub fn spawn(core: Arc<Mutex<StepScheduler>>, interval: Duration) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("pulsegrid-scheduler".to_string())
            .spawn(move || {
                log::debug!("Scheduler thread started ({}ms tick)", interval.as_millis());
                while !thread_shutdown.load(Ordering::Acquire) {
                    run_pass(&core);
                    thread::park_timeout(interval);
                }
                log::debug!("Scheduler thread exiting");
            })?;

        Ok(Self { shutdown, handle })
    }

    /// Run a pass now instead of waiting for the next tick
    pub fn wake(&self) {
        self.handle.thread().unpark();
    }

    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::Release);
        self.handle.thread().unpark();
        if self.handle.join().is_err() {
            log::error!("Scheduler thread panicked");
        }
    }
}
