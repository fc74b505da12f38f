//! # Scheduler — When and How Often Systems Run
//!
//! A scheduler owns an ordered list of systems and decides, once per frame,
//! how many passes to make over it:
//!
//! ```text
//! Startup             1 pass on the first frame, then never
//! Update              1 pass every frame
//! FixedTimeUpdate     one pass per whole fixed tick elapsed (0..n)
//! RelativeTimeUpdate  tick-sized substeps, then the remainder
//! Shutdown            1 pass on frames where the core is not running
//! ```
//!
//! The timing decision lives in the [`Scheduler`] trait. Everything shared by
//! all schedulers (enabled/disabled systems, the error policy, commands queued
//! while running) lives in the core's [`SchedulerContainer`], which also
//! orders schedulers by their declared dependencies.

mod container;
mod fixed_time_update;
mod relative_time_update;

pub use container::{SchedulerContainer, Systems};
pub use fixed_time_update::FixedTimeUpdate;
pub use relative_time_update::RelativeTimeUpdate;

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::core::Core;
use crate::time::TimeSource;

/// What a scheduler does when one of its systems returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log at debug level and keep going.
    Silent,
    /// Log at error level and keep going.
    #[default]
    LogAndContinue,
    /// Log, finish the current scheduler, then skip the rest of the frame.
    LogAndFinishScheduler,
    /// Log, abandon the current scheduler and stop the core. Later
    /// schedulers still run, so `Shutdown` gets its pass.
    LogAndStop,
    /// Return the error from `run_systems`.
    Nothing,
}

/// Upcast helper so schedulers can be recovered as their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The timing policy of a scheduler.
pub trait Scheduler: AsAny {
    /// Called when the scheduler is registered on a core.
    fn on_register(&mut self, _time: &TimeSource) {}

    /// Number of passes over the enabled systems this frame. The scheduler
    /// is detached from the core while this runs.
    fn prepare(&mut self, core: &mut Core) -> usize;

    /// Called before each pass.
    fn begin_pass(&mut self, _pass: usize) {}
}

/// Runs once, on the first frame.
#[derive(Debug, Default)]
pub struct Startup {
    done: bool,
}

impl Scheduler for Startup {
    fn prepare(&mut self, _: &mut Core) -> usize {
        run_once(&mut self.done)
    }
}

/// Runs every frame.
#[derive(Debug, Default)]
pub struct Update;

impl Scheduler for Update {
    fn prepare(&mut self, _: &mut Core) -> usize {
        1
    }
}

/// Runs on frames where the core is not running: every manual
/// `run_systems` call, and the final frame of `run_core` after `stop`.
#[derive(Debug, Default)]
pub struct Shutdown;

impl Scheduler for Shutdown {
    fn prepare(&mut self, core: &mut Core) -> usize {
        usize::from(!core.is_running())
    }
}

/// One pass the first time, zero afterwards.
pub fn run_once(done: &mut bool) -> usize {
    if *done {
        0
    } else {
        *done = true;
        1
    }
}

/// Last path segment of a type name: `engine_squared::scheduler::Update` →
/// `Update`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_once_flips() {
        let mut done = false;
        assert_eq!(run_once(&mut done), 1);
        assert_eq!(run_once(&mut done), 0);
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name(std::any::type_name::<Update>()), "Update");
        assert_eq!(short_type_name("a::b::Stage<a::C>"), "Stage");
    }

    #[test]
    fn error_policy_serde_names() {
        let policy: ErrorPolicy = serde_json::from_str("\"log_and_stop\"").unwrap();
        assert_eq!(policy, ErrorPolicy::LogAndStop);
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::LogAndContinue);
    }
}
