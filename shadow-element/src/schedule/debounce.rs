//! Debouncer
//!
//! Coalesces bursts of requests into a single deferred invocation.
//!
//! # Behaviour
//!
//! - `run(false)` (re)starts a quiet-period timer of `delay`. Each request
//!   made while the timer is pending pushes it back, but never past
//!   `window start + ceiling`, so continuous requests cannot starve the
//!   action.
//! - `run(true)` cancels any pending timer and invokes the action now.
//! - At most one invocation is pending at a time. A burst of requests yields
//!   one invocation that observes the state at the moment it fires.
//!
//! Errors returned by a deferred invocation have no caller to go to; they are
//! logged. Errors from an immediate invocation are returned to the caller.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use super::timer::{Scheduler, TimerId};
use crate::error::Result;

/// The debounced work.
pub type Action = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Upper bound on how long a burst may defer the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaxDelay {
    /// A multiple of the quiet-period delay.
    Multiple(u32),
    /// An absolute bound in milliseconds.
    AbsoluteMs(u64),
}

/// Debounce timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebounceConfig {
    /// Quiet period in milliseconds.
    pub delay_ms: u64,
    pub max_delay: MaxDelay,
}

impl DebounceConfig {
    pub fn new(delay_ms: u64, max_delay: MaxDelay) -> Self {
        Self { delay_ms, max_delay }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// The longest a burst may defer the action, measured from its first
    /// request.
    pub fn ceiling(&self) -> Duration {
        match self.max_delay {
            MaxDelay::Multiple(factor) => self.delay() * factor.max(1),
            MaxDelay::AbsoluteMs(ms) => Duration::from_millis(ms),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: 10,
            max_delay: MaxDelay::Multiple(5),
        }
    }
}

#[derive(Debug, Default)]
struct DebounceState {
    /// An invocation is owed for the current generation.
    scheduled: bool,
    /// Timer backing the owed invocation, once the scheduler returned it.
    timer: Option<TimerId>,
    /// Requests folded into the pending invocation.
    requests: u32,
    window_start: Option<Instant>,
    /// Bumped whenever the pending invocation is replaced, fired or
    /// cancelled, so a stale timer cannot fire a second time.
    generation: u64,
}

impl DebounceState {
    /// Forget the owed invocation. Returns whether one was owed and the timer
    /// to cancel, if any.
    fn reset(&mut self) -> (bool, Option<TimerId>) {
        let was_scheduled = std::mem::take(&mut self.scheduled);
        self.requests = 0;
        self.window_start = None;
        self.generation += 1;
        (was_scheduled, self.timer.take())
    }
}

struct DebounceInner {
    action: Action,
    config: DebounceConfig,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<DebounceState>,
}

impl DebounceInner {
    fn fire(&self, generation: u64) {
        let requests = {
            let mut state = self.state.lock();
            if state.generation != generation || !state.scheduled {
                return;
            }
            let requests = state.requests;
            state.reset();
            requests
        };

        trace!(requests, "debounced action firing");
        if let Err(err) = (self.action)() {
            error!(error = %err, "debounced action failed");
        }
    }
}

/// Trailing-edge debouncer with a forced ceiling.
pub struct Debouncer {
    inner: Arc<DebounceInner>,
}

impl Debouncer {
    pub fn new(action: Action, config: DebounceConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(DebounceInner {
                action,
                config,
                scheduler,
                state: Mutex::new(DebounceState::default()),
            }),
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.inner.config
    }

    /// Request the action.
    ///
    /// With `immediate` the action runs before this returns and its result is
    /// passed through. Otherwise it is deferred and this returns `Ok(())`.
    pub fn run(&self, immediate: bool) -> Result<()> {
        if immediate {
            self.flush_now()
        } else {
            self.defer();
            Ok(())
        }
    }

    /// Cancel the pending invocation, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let (was_scheduled, timer) = self.inner.state.lock().reset();
        if let Some(id) = timer {
            self.inner.scheduler.cancel(id);
        }
        if was_scheduled {
            trace!("debounced action cancelled");
        }
        was_scheduled
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().scheduled
    }

    /// Requests folded into the pending invocation.
    pub fn pending_requests(&self) -> u32 {
        self.inner.state.lock().requests
    }

    fn flush_now(&self) -> Result<()> {
        let (flushed, timer) = self.inner.state.lock().reset();
        if let Some(id) = timer {
            self.inner.scheduler.cancel(id);
        }

        trace!(flushed, "action running immediately");
        (self.inner.action)()
    }

    fn defer(&self) {
        let inner = &self.inner;
        let now = inner.scheduler.now();

        // The scheduler is called without the state lock: it may run the
        // task before `schedule` returns.
        let (wait, generation, replaced) = {
            let mut state = inner.state.lock();
            let window_start = *state.window_start.get_or_insert(now);
            state.requests += 1;

            let deadline = window_start + inner.config.ceiling();
            let fire_at = (now + inner.config.delay()).min(deadline);

            state.scheduled = true;
            state.generation += 1;
            (fire_at.saturating_duration_since(now), state.generation, state.timer.take())
        };

        if let Some(id) = replaced {
            inner.scheduler.cancel(id);
        }

        let weak: Weak<DebounceInner> = Arc::downgrade(inner);
        let id = inner.scheduler.schedule(
            wait,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation);
                }
            }),
        );

        let mut state = inner.state.lock();
        if state.generation == generation {
            state.timer = Some(id);
            trace!(requests = state.requests, ?wait, "debounced action scheduled");
        } else {
            // Fired inline, flushed, cancelled or superseded meanwhile
            drop(state);
            inner.scheduler.cancel(id);
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Debouncer")
            .field("config", &self.inner.config)
            .field("pending", &state.scheduled)
            .field("requests", &state.requests)
            .finish()
    }
}
