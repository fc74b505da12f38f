use std::time::Duration;

use super::Scheduler;
use crate::core::Core;
use crate::time::{Stopwatch, TimeSource};

/// Runs its systems with the real frame delta, split into substeps no longer
/// than the target tick.
///
/// A 0.5 s frame with a 0.2 s target runs three passes with deltas 0.2, 0.2
/// and 0.1. A 0.05 s frame runs one pass with 0.05. Remainders at or below
/// [`REMAINDER_THRESHOLD`](Self::REMAINDER_THRESHOLD) are dropped instead of
/// producing a near-empty pass. A frame never runs more than
/// [`MAX_SUBSTEPS`](Self::MAX_SUBSTEPS) passes; time beyond that is dropped.
#[derive(Debug)]
pub struct RelativeTimeUpdate {
    target_tick_rate: Duration,
    source: TimeSource,
    stopwatch: Stopwatch,
    full_steps: usize,
    rest: Duration,
    current: Duration,
}

impl RelativeTimeUpdate {
    pub const DEFAULT_TARGET_TICK_RATE: Duration = Duration::from_millis(20);
    pub const REMAINDER_THRESHOLD: Duration = Duration::from_micros(100);
    pub const MAX_SUBSTEPS: usize = 1024;

    pub fn new(target_tick_rate: Duration) -> Self {
        Self {
            target_tick_rate: Self::valid_tick(target_tick_rate),
            source: TimeSource::real(),
            stopwatch: Stopwatch::default(),
            full_steps: 0,
            rest: Duration::ZERO,
            current: Duration::ZERO,
        }
    }

    fn valid_tick(tick: Duration) -> Duration {
        if tick.is_zero() {
            log::warn!(
                "Target tick rate must be non-zero, using {:?}",
                Self::DEFAULT_TARGET_TICK_RATE
            );
            Self::DEFAULT_TARGET_TICK_RATE
        } else {
            tick
        }
    }

    pub fn target_tick_rate(&self) -> Duration {
        self.target_tick_rate
    }

    pub fn set_target_tick_rate(&mut self, tick: Duration) {
        self.target_tick_rate = Self::valid_tick(tick);
    }

    /// Delta of the pass currently running.
    pub fn current_delta(&self) -> Duration {
        self.current
    }

    pub fn current_delta_time(&self) -> f32 {
        self.current.as_secs_f32()
    }

    /// Number of full ticks in `delta` and the remainder pass, zero when
    /// dropped.
    fn split(&self, delta: Duration) -> (usize, Duration) {
        let tick = self.target_tick_rate;
        let full = delta.as_nanos() / tick.as_nanos();
        if full > Self::MAX_SUBSTEPS as u128 {
            log::warn!(
                "Frame of {delta:?} needs {full} substeps of {tick:?}, running {}",
                Self::MAX_SUBSTEPS
            );
            return (Self::MAX_SUBSTEPS, Duration::ZERO);
        }
        let full = full as u32;
        let rest = delta - tick * full;
        if rest > Self::REMAINDER_THRESHOLD {
            (full as usize, rest)
        } else {
            (full as usize, Duration::ZERO)
        }
    }
}

impl Default for RelativeTimeUpdate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TARGET_TICK_RATE)
    }
}

impl Scheduler for RelativeTimeUpdate {
    fn on_register(&mut self, time: &TimeSource) {
        self.source = time.clone();
        self.stopwatch = Stopwatch::starting_at(time.now());
    }

    fn prepare(&mut self, _: &mut Core) -> usize {
        let delta = self.stopwatch.lap(self.source.now());
        (self.full_steps, self.rest) = self.split(delta);
        self.full_steps + usize::from(!self.rest.is_zero())
    }

    fn begin_pass(&mut self, pass: usize) {
        self.current = if pass < self.full_steps {
            self.target_tick_rate
        } else {
            self.rest
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Default)]
    struct Deltas(Vec<f32>);

    fn record(core: &mut Core) {
        let delta = core.scheduler::<RelativeTimeUpdate>().current_delta_time();
        core.resource_mut::<Deltas>().0.push(delta);
    }

    fn core_with_recorder() -> (Core, TimeSource) {
        let time = TimeSource::manual();
        let mut core = Core::with_time_source(time.clone());
        core.register_resource(Deltas::default());
        core.systems::<RelativeTimeUpdate>().add(record);
        core.scheduler_mut::<RelativeTimeUpdate>()
            .set_target_tick_rate(ms(200));
        (core, time)
    }

    #[test]
    fn long_frames_are_split_into_substeps() {
        let (mut core, time) = core_with_recorder();
        core.run_systems().unwrap();
        assert!(core.resource::<Deltas>().0.is_empty());

        time.advance(ms(500));
        core.run_systems().unwrap();
        let deltas = &core.resource::<Deltas>().0;
        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0], 0.2);
        assert_eq!(deltas[1], 0.2);
        assert!(deltas[2] > 0.0 && deltas[2] < 0.2);
    }

    #[test]
    fn short_frames_run_once_with_the_real_delta() {
        let (mut core, time) = core_with_recorder();
        time.advance(ms(50));
        core.run_systems().unwrap();
        time.advance(ms(100));
        core.run_systems().unwrap();
        let deltas = &core.resource::<Deltas>().0;
        assert_eq!(deltas.len(), 2);
        assert!(deltas[1] > deltas[0]);
    }

    #[test]
    fn tiny_remainders_are_dropped() {
        let rel = RelativeTimeUpdate::new(ms(200));
        assert_eq!(rel.split(ms(400)), (2, Duration::ZERO));
        assert_eq!(rel.split(ms(450)), (2, ms(50)));
        assert_eq!(rel.split(Duration::from_micros(50)), (0, Duration::ZERO));
        assert_eq!(rel.split(ms(1)), (0, ms(1)));
    }

    #[test]
    fn nanosecond_ticks_are_capped() {
        let rel = RelativeTimeUpdate::new(Duration::from_nanos(1));
        assert_eq!(
            rel.split(Duration::from_secs(5)),
            (RelativeTimeUpdate::MAX_SUBSTEPS, Duration::ZERO)
        );

        let (mut core, time) = core_with_recorder();
        core.scheduler_mut::<RelativeTimeUpdate>()
            .set_target_tick_rate(Duration::from_nanos(1));
        time.advance(Duration::from_secs(5));
        core.run_systems().unwrap();
        assert_eq!(
            core.resource::<Deltas>().0.len(),
            RelativeTimeUpdate::MAX_SUBSTEPS
        );
    }
}
