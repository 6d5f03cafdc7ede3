//! Animated ratio transitions.
//!
//! A worker thread posts [`RatioTick`] messages on a channel and never
//! touches the tree. The thread that owns the [`SplitPane`](crate::SplitPane)
//! drains the channel and applies each tick like a drag step.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Target ratio for one binary split at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioTick {
    pub split: NodeId,
    pub ratio: f64,
}

/// Linear move of a split's ratio from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioTransition {
    pub split: NodeId,
    pub from: f64,
    pub to: f64,
    /// Number of ticks; at least one is always emitted.
    pub steps: u32,
}

impl RatioTransition {
    #[must_use]
    pub const fn new(split: NodeId, from: f64, to: f64, steps: u32) -> Self {
        Self {
            split,
            from,
            to,
            steps,
        }
    }

    /// Ticks in order. The last one lands exactly on `to`.
    pub fn ticks(&self) -> impl Iterator<Item = RatioTick> + '_ {
        let steps = self.steps.max(1);
        (1..=steps).map(move |step| {
            let ratio = if step == steps {
                self.to
            } else {
                self.from + (self.to - self.from) * f64::from(step) / f64::from(steps)
            };
            RatioTick {
                split: self.split,
                ratio,
            }
        })
    }
}

/// Channel pair carrying ratio ticks to the layout thread.
#[must_use]
pub fn ratio_channel() -> (mpsc::Sender<RatioTick>, mpsc::Receiver<RatioTick>) {
    mpsc::channel()
}

/// Cooperative stop flag shared with a transition worker.
#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }

    /// Wait for either the stop signal or a timeout. Returns `true` if stopped.
    fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return true;
        }
        let (stopped, _) = cvar
            .wait_timeout(stopped, duration)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

/// Handle to a running transition worker.
pub struct TransitionHandle {
    signal: StopSignal,
    thread: Option<thread::JoinHandle<()>>,
}

impl TransitionHandle {
    /// Stop posting ticks and wait for the worker to exit.
    pub fn stop(mut self) {
        self.signal.stop();
        self.join_inner();
    }

    /// Wait for the worker to post every tick.
    pub fn join(mut self) {
        self.join_inner();
    }

    fn join_inner(&mut self) {
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            tracing::warn!("ratio transition worker panicked");
        }
    }
}

impl Drop for TransitionHandle {
    fn drop(&mut self) {
        self.signal.stop();
    }
}

/// Post `transition`'s ticks on `sender`, one per `interval`.
///
/// The worker exits early when stopped or when the receiver is dropped.
pub fn spawn_ratio_transition(
    transition: RatioTransition,
    interval: Duration,
    sender: mpsc::Sender<RatioTick>,
) -> TransitionHandle {
    let signal = StopSignal::new();
    let worker_signal = signal.clone();
    tracing::debug!(
        split = transition.split.get(),
        from = transition.from,
        to = transition.to,
        steps = transition.steps,
        "ratio transition started"
    );
    let thread = thread::spawn(move || {
        for tick in transition.ticks() {
            if worker_signal.wait_timeout(interval) {
                break;
            }
            if sender.send(tick).is_err() {
                break;
            }
        }
    });
    TransitionHandle {
        signal,
        thread: Some(thread),
    }
}
