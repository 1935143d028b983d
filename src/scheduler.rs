//! Recurring task scheduler.
//!
//! Runs one named job on a fixed period, aligned to wall-clock multiples of
//! that period. With the default 60 s period this fires at the top of every
//! minute, the same cadence as the cron expression `* * * * *`.
//!
//! State is `Stopped -> Running`, one way. The transition is a
//! compare-and-set on an atomic owned by the scheduler, so a second `start`
//! (from any thread) is a no-op that reports `AlreadyRunning`.
//!
//! A tick that fails or panics is logged and the schedule carries on.

use crate::error::AirQualityError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

pub struct Scheduler {
    name: String,
    period: Duration,
    state: AtomicU8,
    ticks: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            state: AtomicU8::new(STOPPED),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Once-a-minute scheduler.
    pub fn every_minute(name: impl Into<String>) -> Self {
        Self::new(name, Duration::from_secs(60))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Number of ticks fired so far, successful or not.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Starts the recurring task on a background thread.
    ///
    /// Returns `AlreadyRunning` without spawning anything if this scheduler
    /// was started before. Fails only if the OS refuses to spawn the thread,
    /// in which case the scheduler goes back to `Stopped`.
    pub fn start<F>(&self, job: F) -> std::io::Result<StartOutcome>
    where
        F: FnMut() -> Result<(), AirQualityError> + Send + 'static,
    {
        if self
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(task = %self.name, "scheduled task is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let name = self.name.clone();
        let period = self.period;
        let ticks = Arc::clone(&self.ticks);

        let spawned = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_forever(&name, period, &ticks, job));

        match spawned {
            Ok(_) => {
                tracing::info!(
                    task = %self.name,
                    period_secs = self.period.as_secs_f64(),
                    "scheduled task started"
                );
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                self.state.store(STOPPED, Ordering::Release);
                Err(e)
            }
        }
    }
}

fn run_forever<F>(name: &str, period: Duration, ticks: &AtomicU64, mut job: F)
where
    F: FnMut() -> Result<(), AirQualityError>,
{
    loop {
        thread::sleep(delay_until_next_tick(SystemTime::now(), period));
        ticks.fetch_add(1, Ordering::Relaxed);

        match panic::catch_unwind(AssertUnwindSafe(&mut job)) {
            Ok(Ok(())) => tracing::debug!(task = %name, "scheduled run complete"),
            Ok(Err(e)) => tracing::error!(task = %name, error = %e, "scheduled run failed"),
            Err(_) => tracing::error!(task = %name, "scheduled run panicked"),
        }
    }
}

/// Time from `now` until the next wall-clock multiple of `period`.
///
/// Exactly on a boundary the next tick is a full period away, so a job
/// that returns instantly never fires twice for the same boundary.
pub fn delay_until_next_tick(now: SystemTime, period: Duration) -> Duration {
    let period_nanos = period.as_nanos().max(1);
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let remaining = period_nanos - since_epoch % period_nanos;
    Duration::from_nanos(remaining.min(u64::MAX as u128) as u64)
}
