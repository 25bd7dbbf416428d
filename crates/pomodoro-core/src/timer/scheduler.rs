//! Tick sources for the timer engine.
//!
//! A scheduler is asked to deliver a [`Tick`] every `period` until the
//! subscription is cancelled. How ticks reach the engine is up to the caller:
//! the engine only registers and cancels subscriptions, and checks the
//! subscription id of every tick it is handed (see
//! [`TimerEngine::on_tick`](super::TimerEngine::on_tick)).

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Cadence of the countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one registered repeating tick source.
pub type SubscriptionId = u64;

/// One tick delivered by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub subscription: SubscriptionId,
}

/// "Invoke every `period` until cancelled."
pub trait TickScheduler {
    /// Begin delivering ticks for `id`, the first one `period` from now.
    fn schedule(&mut self, id: SubscriptionId, period: Duration);

    /// Stop delivering ticks for `id`.
    ///
    /// Cancelling an unknown or already-cancelled id is a no-op.
    fn cancel(&mut self, id: SubscriptionId);
}

impl<S: TickScheduler + ?Sized> TickScheduler for Box<S> {
    fn schedule(&mut self, id: SubscriptionId, period: Duration) {
        (**self).schedule(id, period);
    }

    fn cancel(&mut self, id: SubscriptionId) {
        (**self).cancel(id);
    }
}

/// Scheduler that only records subscriptions.
///
/// The owner produces ticks itself, either by calling
/// [`TimerEngine::tick`](super::TimerEngine::tick) directly or by feeding
/// [`ManualScheduler::tick_for`] results to `on_tick`.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    active: HashSet<SubscriptionId>,
    scheduled_total: usize,
    cancelled_total: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.active.contains(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of `schedule` calls seen so far.
    pub fn scheduled_total(&self) -> usize {
        self.scheduled_total
    }

    /// Number of `cancel` calls that actually stopped something.
    pub fn cancelled_total(&self) -> usize {
        self.cancelled_total
    }

    /// The single active subscription, if there is exactly one.
    pub fn current(&self) -> Option<SubscriptionId> {
        if self.active.len() == 1 {
            self.active.iter().next().copied()
        } else {
            None
        }
    }

    /// A tick as the real scheduler would deliver it for `id`.
    pub fn tick_for(&self, id: SubscriptionId) -> Tick {
        Tick { subscription: id }
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, id: SubscriptionId, _period: Duration) {
        self.active.insert(id);
        self.scheduled_total += 1;
    }

    fn cancel(&mut self, id: SubscriptionId) {
        if self.active.remove(&id) {
            self.cancelled_total += 1;
        }
    }
}

/// Scheduler backed by `tokio::time::interval`.
///
/// Each subscription is a spawned task pushing [`Tick`]s into an unbounded
/// channel; the receiving loop hands them to the engine one at a time.
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    sender: UnboundedSender<Tick>,
    tasks: HashMap<SubscriptionId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(sender: UnboundedSender<Tick>) -> Self {
        Self {
            sender,
            tasks: HashMap::new(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule(&mut self, id: SubscriptionId, period: Duration) {
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            // Late ticks push the next one back instead of bursting.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(Tick { subscription: id }).is_err() {
                    tracing::debug!(subscription = id, "tick receiver dropped");
                    break;
                }
            }
        });
        if let Some(previous) = self.tasks.insert(id, task) {
            previous.abort();
        }
        tracing::trace!(subscription = id, ?period, "tick subscription scheduled");
    }

    fn cancel(&mut self, id: SubscriptionId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
            tracing::trace!(subscription = id, "tick subscription cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
