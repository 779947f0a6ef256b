//! Scheduling
//!
//! Timer backends and the debouncer that coalesces render requests.

mod debounce;
mod timer;

pub use debounce::{Action, DebounceConfig, Debouncer, MaxDelay};
pub use timer::{ManualScheduler, Scheduler, Task, TimerId, TokioScheduler};
