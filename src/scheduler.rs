//! Interval scheduling of polling rounds.
//!
//! The [`Scheduler`] is a two-state machine, `Idle` and `Running`. Starting it
//! spawns a background task that runs one round immediately and then one per
//! interval until [`Scheduler::stop`] is called. Rounds run inline in that
//! task, so at most one scheduled round is ever in flight. A tick that comes
//! due during a long round waits for it, then fires once; further deadlines
//! missed by the same round are dropped and later ticks keep the original
//! phase.
//!
//! [`Scheduler::refresh_now`] runs an extra round without moving the interval:
//! the next tick still fires at its original deadline.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use statuswatch::{HttpSource, Scheduler, StatusEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(StatusEngine::builder(Arc::new(HttpSource::builder().build()?)).build());
//!     let scheduler = Scheduler::new(engine.clone());
//!
//!     scheduler.start(Duration::from_secs(60));
//!     let mut rounds = engine.subscribe();
//!     while let Some(update) = rounds.recv().await {
//!         println!("round {} done", update.round);
//!     }
//!     scheduler.stop().await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::engine::StatusEngine;

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => f.write_str("idle"),
            SchedulerState::Running => f.write_str("running"),
        }
    }
}

/// Handle to the background polling loop.
struct PollLoop {
    stop_tx: watch::Sender<bool>,
    refresh_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
    interval: Duration,
}

/// Drives a [`StatusEngine`] on a fixed interval.
pub struct Scheduler {
    engine: Arc<StatusEngine>,
    poll_loop: Mutex<Option<PollLoop>>,
}

impl Scheduler {
    pub fn new(engine: Arc<StatusEngine>) -> Self {
        Self {
            engine,
            poll_loop: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<StatusEngine> {
        &self.engine
    }

    /// Start polling every `interval`, beginning immediately.
    ///
    /// Returns `false` without doing anything if already running or if
    /// `interval` is zero.
    pub fn start(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            warn!("refusing to start scheduler with a zero interval");
            return false;
        }

        let mut poll_loop = self.poll_loop.lock();
        if let Some(existing) = poll_loop.as_ref() {
            if !existing.task.is_finished() {
                debug!(interval_secs = existing.interval.as_secs(), "scheduler already running");
                return false;
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        // One pending refresh is enough; further requests coalesce into it.
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let task = tokio::spawn(supervise(run_loop(
            self.engine.clone(),
            interval,
            stop_rx,
            refresh_rx,
        )));

        info!(interval_secs = interval.as_secs(), "scheduler started");
        *poll_loop = Some(PollLoop {
            stop_tx,
            refresh_tx,
            task,
            interval,
        });
        true
    }

    /// Stop polling and wait for the loop to exit. A round in flight is
    /// abandoned. Safe to call when idle.
    pub async fn stop(&self) {
        let poll_loop = self.poll_loop.lock().take();
        let Some(poll_loop) = poll_loop else {
            return;
        };

        let _ = poll_loop.stop_tx.send(true);
        if poll_loop.task.await.is_ok() {
            info!("scheduler stopped");
        }
    }

    /// Run one extra round now without disturbing the interval.
    ///
    /// While idle the round runs on a one-off task.
    pub fn refresh_now(&self) {
        let poll_loop = self.poll_loop.lock();
        match poll_loop.as_ref() {
            Some(running) if !running.task.is_finished() => {
                if running.refresh_tx.try_send(()).is_err() {
                    debug!("refresh already pending");
                }
            }
            _ => {
                debug!("manual refresh while idle");
                let engine = self.engine.clone();
                tokio::spawn(async move {
                    engine.run_round().await;
                });
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.poll_loop.lock().as_ref() {
            Some(running) if !running.task.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    /// The active interval, if running.
    pub fn interval(&self) -> Option<Duration> {
        self.poll_loop
            .lock()
            .as_ref()
            .filter(|running| !running.task.is_finished())
            .map(|running| running.interval)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("interval", &self.interval())
            .finish()
    }
}

/// Run the polling loop on its own task and log if it dies.
async fn supervise(poll_loop: impl std::future::Future<Output = ()> + Send + 'static) {
    match tokio::spawn(poll_loop).await {
        Ok(()) => {}
        Err(e) if e.is_panic() => error!(error = %e, "scheduler task panicked"),
        Err(e) => error!(error = %e, "scheduler task failed"),
    }
}

async fn run_loop(
    engine: Arc<StatusEngine>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    mut refresh_rx: mpsc::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
            Some(()) = refresh_rx.recv() => debug!("manual refresh"),
        }

        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = engine.run_round() => {}
        }
    }
}
