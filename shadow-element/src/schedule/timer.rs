//! Timers
//!
//! Deferred work goes through a [`Scheduler`]: a cancellable one-shot timer
//! plus the monotonic clock it measures against. Two implementations ship:
//!
//! - [`TokioScheduler`] spawns a sleeping task per timer on a tokio runtime.
//! - [`ManualScheduler`] keeps a queue and only moves time when told to, which
//!   makes debounce behaviour deterministic in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Work run when a timer fires.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocate a fresh id. Ids increase in allocation order, so schedulers
    /// outside this crate can mint them too.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancellable one-shot timer with a monotonic clock.
pub trait Scheduler: Send + Sync {
    /// The current time on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

/// Timers backed by tokio tasks.
///
/// `now` reads tokio's clock, so a runtime with paused time drives both the
/// clock and the timers.
pub struct TokioScheduler {
    handle: Handle,
    timers: Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Use an explicit runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Use the runtime the caller is running on. Panics outside a runtime,
    /// like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId::new();
        let timers = Arc::clone(&self.timers);

        // Hold the map while spawning so the task cannot remove itself first
        let mut guard = self.timers.lock();
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if timers.lock().remove(&id).is_some() {
                task();
            }
        });
        guard.insert(id, join);

        trace!(?id, ?delay, "tokio timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.timers.lock().remove(&id) {
            Some(join) => {
                join.abort();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[derive(Default)]
struct ManualState {
    elapsed: Duration,
    queue: BTreeMap<(Duration, TimerId), Task>,
    due: HashMap<TimerId, Duration>,
}

/// A scheduler whose clock only moves when [`advance`](Self::advance) is
/// called.
///
/// Timers fire in due-time order, ties in scheduling order. A timer scheduled
/// by a firing task runs in the same `advance` call if it falls due within it.
pub struct ManualScheduler {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Time elapsed on this clock since creation.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().elapsed + by;
        let mut fired = 0;

        loop {
            // Never hold the lock while a task runs; tasks schedule new timers
            let task = {
                let mut state = self.state.lock();
                let Some((&(due, id), _)) = state.queue.first_key_value() else {
                    break;
                };
                if due > target {
                    break;
                }
                state.due.remove(&id);
                state.elapsed = state.elapsed.max(due);
                state.queue.remove(&(due, id))
            };

            if let Some(task) = task {
                task();
                fired += 1;
            }
        }

        let mut state = self.state.lock();
        state.elapsed = state.elapsed.max(target);
        fired
    }

    /// Fire every pending timer, moving the clock as far as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        loop {
            let next = {
                let state = self.state.lock();
                state.queue.keys().next().map(|&(due, _)| due.saturating_sub(state.elapsed))
            };
            match next {
                Some(wait) => fired += self.advance(wait),
                None => return fired,
            }
        }
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        self.origin + self.state.lock().elapsed
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.state.lock();
        let id = TimerId::new();

        let due = state.elapsed + delay;
        state.queue.insert((due, id), task);
        state.due.insert(id, due);
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.lock();
        match state.due.remove(&id) {
            Some(due) => state.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("elapsed", &state.elapsed)
            .field("pending", &state.queue.len())
            .finish()
    }
}
