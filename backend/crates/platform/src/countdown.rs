//! Cancellable 1-second countdown
//!
//! A tokio task ticks once per second and publishes the whole seconds left
//! (rounded up) on a `watch` channel. The last published value is 0, after
//! which the task exits. Dropping the [`Countdown`] aborts the task, so a
//! countdown never outlives its owner.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};

const TICK: Duration = Duration::from_secs(1);

/// Whole seconds left, rounded up
pub fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[derive(Debug)]
pub struct Countdown {
    deadline: Instant,
    rx: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start ticking; must be called inside a tokio runtime
    pub fn start(duration: Duration) -> Self {
        let deadline = Instant::now() + duration;
        let (tx, rx) = watch::channel(ceil_secs(duration));

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let left = ceil_secs(deadline.saturating_duration_since(Instant::now()));
                if tx.send(left).is_err() || left == 0 {
                    break;
                }
            }
        });

        Self { deadline, rx, handle }
    }

    /// Seconds left right now, computed from the deadline
    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_secs() == 0
    }

    /// Receiver of per-tick values
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.rx.clone()
    }

    /// Per-tick values ending with 0; owns the countdown so dropping the
    /// stream cancels the ticker
    pub fn into_stream(self) -> impl Stream<Item = u64> + Send + 'static {
        let rx = self.rx.clone();
        WatchStream::new(rx).map(move |secs| {
            let _owner = &self;
            secs
        })
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
