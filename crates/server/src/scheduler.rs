//! Periodic sweep tasks.
//!
//! Each scheduled sweep runs on its own tokio task and is identified by a
//! [`TaskId`]. Cancelling a task takes effect at its next timer wait: the
//! sweep body is synchronous, so a sweep already in progress always runs to
//! completion.
//!
//! A sweep that panics is reported through [`diagnostics`](crate::diagnostics),
//! passed to the failure hook if one is set, and the schedule keeps firing.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::diagnostics;

new_key_type! {
    /// Identity of one scheduled periodic task.
    pub struct TaskId;
}

/// Longest delay or period a task accepts. Longer values are clamped.
pub const MAX_PERIOD: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

type FailureHook = Arc<dyn Fn(TaskId) + Send + Sync>;

struct ScheduledTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

pub struct PassScheduler {
    runtime: Handle,
    tasks: Mutex<SlotMap<TaskId, ScheduledTask>>,
    on_panic: Option<FailureHook>,
}

impl PassScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Mutex::new(SlotMap::with_key()),
            on_panic: None,
        }
    }

    /// Call `hook` with the task id whenever a sweep panics.
    pub fn with_failure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(TaskId) + Send + Sync + 'static,
    {
        self.on_panic = Some(Arc::new(hook));
        self
    }

    /// Run `sweep` after `delay`, then every `period`.
    ///
    /// The sweep receives its own task id for diagnostics. If a sweep
    /// overruns its period, the next firing is delayed rather than bunched.
    /// `delay` and `period` are clamped to [`MAX_PERIOD`].
    pub fn spawn_periodic<F>(&self, name: &'static str, delay: Duration, period: Duration, sweep: F) -> TaskId
    where
        F: Fn(TaskId) + Send + Sync + 'static,
    {
        let delay = delay.min(MAX_PERIOD);
        let period = period.min(MAX_PERIOD);
        let on_panic = self.on_panic.clone();
        let mut tasks = self.tasks.lock().expect("scheduler poisoned");
        tasks.insert_with_key(|id| {
            let handle = self.runtime.spawn(async move {
                // `delay` is clamped, so this cannot overflow.
                let mut interval = tokio::time::interval_at(Instant::now() + delay, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                tracing::info!("Sweep '{}' scheduled (every {:?}, task {:?})", name, period, id);

                loop {
                    interval.tick().await;
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| sweep(id))) {
                        let cause = anyhow::anyhow!("{}", panic_message(panic.as_ref()));
                        diagnostics::report_error(
                            &format!("Sweep '{}' panicked. TaskId: {:?}", name, id),
                            Some(&cause),
                        );
                        if let Some(hook) = &on_panic {
                            hook(id);
                        }
                    }
                }
            });
            ScheduledTask { name, handle }
        })
    }

    /// Stop a task before its next firing. Returns whether it was scheduled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let task = self.tasks.lock().expect("scheduler poisoned").remove(id);
        match task {
            Some(task) => {
                task.handle.abort();
                tracing::debug!("Sweep '{}' cancelled (task {:?})", task.name, id);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.tasks.lock().expect("scheduler poisoned").drain().collect();
        for (id, task) in drained {
            task.handle.abort();
            tracing::debug!("Sweep '{}' cancelled (task {:?})", task.name, id);
        }
    }

    pub fn is_active(&self, id: TaskId) -> bool {
        self.tasks
            .lock()
            .expect("scheduler poisoned")
            .get(id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.tasks.lock().expect("scheduler poisoned").len()
    }
}

impl Drop for PassScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
