//! Per-question countdown
//!
//! `SessionTimer` emits the remaining seconds once per period, starting with
//! the full value and ending with `0`. Only one run is ever live: starting
//! again cancels the previous run first.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// A cancellable once-per-second countdown
pub struct SessionTimer {
    /// Tick period (one second in production)
    period: Duration,

    /// Id of the run allowed to emit; bumped on every start/cancel
    live_run: Arc<Mutex<u64>>,

    /// Handle for the countdown task
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            live_run: Arc::new(Mutex::new(0)),
            task: None,
        }
    }

    /// Start counting down from `seconds`.
    ///
    /// `on_tick` receives `seconds, seconds - 1, ..., 0` and is never called
    /// again once [`cancel`](Self::cancel) has returned. Returning `false`
    /// from `on_tick` stops the run early.
    pub fn start<F>(&mut self, seconds: u32, mut on_tick: F)
    where
        F: FnMut(u32) -> bool + Send + 'static,
    {
        let run = self.bump();
        let live_run = Arc::clone(&self.live_run);
        let period = self.period;

        debug!("Timer run {} started at {}s", run, seconds);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut remaining = seconds;
            loop {
                // First tick completes immediately
                ticker.tick().await;

                // Emit under the lock so cancel() cannot interleave with a tick
                let keep_going = {
                    let current = match live_run.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if *current != run {
                        return;
                    }
                    on_tick(remaining)
                };

                if !keep_going || remaining == 0 {
                    break;
                }
                remaining -= 1;
            }

            debug!("Timer run {} finished", run);
        }));
    }

    /// Stop the current run, if any. No tick is delivered after this returns.
    pub fn cancel(&mut self) {
        self.bump();
    }

    /// Whether a run is still counting down
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn bump(&mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut current = match self.live_run.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current += 1;
        *current
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
