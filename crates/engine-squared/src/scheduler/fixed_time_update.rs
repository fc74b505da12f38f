use std::time::Duration;

use super::Scheduler;
use crate::core::Core;
use crate::time::{Clock, TimeSource};

/// Runs its systems once per elapsed fixed tick.
///
/// Fast frames run zero passes and bank the time; slow frames run several
/// passes to catch up. The leftover below one tick carries into the next
/// frame.
#[derive(Debug)]
pub struct FixedTimeUpdate {
    clock: Clock,
    source: TimeSource,
}

impl FixedTimeUpdate {
    pub fn new(tick_rate: Duration) -> Self {
        Self {
            clock: Clock::new(tick_rate),
            source: TimeSource::real(),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        self.clock.tick_rate()
    }

    /// Change the tick length. Best done before the loop starts: the time
    /// already banked is reinterpreted with the new length.
    pub fn set_tick_rate(&mut self, tick_rate: Duration) {
        self.clock.set_tick_rate(tick_rate);
    }

    /// Time banked towards the next tick.
    pub fn remainder(&self) -> Duration {
        self.clock.remainder()
    }
}

impl Default for FixedTimeUpdate {
    fn default() -> Self {
        Self::new(Clock::DEFAULT_TICK_RATE)
    }
}

impl Scheduler for FixedTimeUpdate {
    fn on_register(&mut self, time: &TimeSource) {
        self.source = time.clone();
        self.clock.reset(time.now());
    }

    fn prepare(&mut self, _: &mut Core) -> usize {
        self.clock.update(self.source.now());
        self.clock.elapsed_ticks() as usize
    }
}
