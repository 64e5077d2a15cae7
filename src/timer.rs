//! Cancellable countdowns.
//!
//! A [`Countdown`] is the handle returned when a timer is scheduled. It owns
//! a background tick task that publishes the remaining whole seconds on a
//! watch channel. Cancelling the handle (or dropping it) aborts the task, so
//! no tick is published afterwards.
//!
//! Remaining time is always derived from the deadline, never from counting
//! ticks, so a late tick cannot make the countdown drift.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

/// Handle to a running countdown. Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Countdown {
    label: &'static str,
    total: Duration,
    deadline: Instant,
    frozen: Option<Duration>,
    ticks: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Schedule a countdown of `total`, publishing every `tick`. A zero
    /// `tick` is raised to one millisecond.
    pub fn start(label: &'static str, total: Duration, tick: Duration) -> Self {
        let tick = tick.max(Duration::from_millis(1));
        let deadline = Instant::now() + total;
        let (tx, ticks) = watch::channel(total.as_secs());
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                let left = deadline.saturating_duration_since(Instant::now());
                tx.send_replace(left.as_secs());
                if left.is_zero() {
                    break;
                }
            }
        });
        debug!(timer = label, total_secs = total.as_secs(), "countdown started");
        Self {
            label,
            total,
            deadline,
            frozen: None,
            ticks,
            task,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Time left, floored at zero. Frozen once cancelled.
    pub fn remaining(&self) -> Duration {
        self.frozen
            .unwrap_or_else(|| self.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn is_cancelled(&self) -> bool {
        self.frozen.is_some()
    }

    /// Receiver of the whole seconds published at each tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.clone()
    }

    /// Stop ticking. Idempotent.
    pub fn cancel(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.remaining());
            self.task.abort();
            debug!(timer = self.label, "countdown cancelled");
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn remaining_follows_the_clock() {
        let countdown = Countdown::start("otp", Duration::from_secs(60), SECOND);
        assert_eq!(countdown.remaining(), Duration::from_secs(60));

        time::advance(Duration::from_secs(15)).await;
        assert_eq!(countdown.remaining(), Duration::from_secs(45));
        assert!(!countdown.is_elapsed());

        time::advance(Duration::from_secs(50)).await;
        assert_eq!(countdown.remaining(), Duration::ZERO);
        assert!(countdown.is_elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_published() {
        let countdown = Countdown::start("rental", Duration::from_secs(10), SECOND);
        let ticks = countdown.subscribe();

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(*ticks.borrow(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_cancel() {
        let mut countdown = Countdown::start("otp", Duration::from_secs(60), SECOND);
        let ticks = countdown.subscribe();

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(*ticks.borrow(), 58);

        countdown.cancel();
        let frozen = countdown.remaining();
        time::sleep(Duration::from_secs(10)).await;

        assert!(countdown.is_cancelled());
        assert_eq!(*ticks.borrow(), 58);
        assert_eq!(countdown.remaining(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_task() {
        let countdown = Countdown::start("otp", Duration::from_secs(60), SECOND);
        let ticks = countdown.subscribe();
        drop(countdown);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*ticks.borrow(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn task_stops_at_zero() {
        let countdown = Countdown::start("otp", Duration::from_secs(2), SECOND);
        let ticks = countdown.subscribe();

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*ticks.borrow(), 0);
        assert!(countdown.task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let mut countdown = Countdown::start("otp", Duration::from_secs(60), SECOND);
        countdown.cancel();
        let first = countdown.remaining();
        time::advance(SECOND).await;
        countdown.cancel();
        assert_eq!(countdown.remaining(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_still_counts_down() {
        let countdown = Countdown::start("otp", Duration::from_secs(2), Duration::ZERO);
        let ticks = countdown.subscribe();

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(*ticks.borrow(), 0);
        assert!(countdown.task.is_finished());
    }
}
