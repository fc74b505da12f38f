//! Time sources, fixed-step clocks and the per-frame [`Time`] resource.
//!
//! Everything time-dependent reads a shared [`TimeSource`] instead of calling
//! `Instant::now()` directly. A real source follows the wall clock; a manual
//! source only moves when [`TimeSource::advance`] is called, which is what the
//! tests use to step schedulers deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time shared by the core and its schedulers. Cloning shares the
/// same underlying clock.
#[derive(Clone, Debug)]
pub struct TimeSource {
    start: Instant,
    manual: bool,
    offset_nanos: Arc<AtomicU64>,
}

impl TimeSource {
    /// Wall-clock time.
    pub fn real() -> Self {
        Self {
            start: Instant::now(),
            manual: false,
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Time that stands still until advanced.
    pub fn manual() -> Self {
        Self {
            manual: true,
            ..Self::real()
        }
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// Time elapsed since the source was created, plus every manual advance.
    pub fn now(&self) -> Duration {
        let offset = Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed));
        if self.manual {
            offset
        } else {
            self.start.elapsed() + offset
        }
    }

    /// Move time forward. On a real source this adds to the wall clock.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::Relaxed);
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::real()
    }
}

/// Measures the time between successive samples of a [`TimeSource`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Stopwatch {
    last: Duration,
}

impl Stopwatch {
    pub fn starting_at(now: Duration) -> Self {
        Self { last: now }
    }

    /// Time since the previous lap; restarts the lap.
    pub fn lap(&mut self, now: Duration) -> Duration {
        let delta = now.saturating_sub(self.last);
        self.last = now;
        delta
    }
}

/// Fixed-step accumulator.
///
/// Each [`update`](Clock::update) adds the time since the previous one to an
/// accumulator and converts as many whole ticks as fit into
/// [`elapsed_ticks`](Clock::elapsed_ticks). The leftover carries over, so a
/// 0.1 s frame followed by another 0.1 s frame yields one 0.2 s tick.
#[derive(Clone, Debug)]
pub struct Clock {
    tick_rate: Duration,
    stopwatch: Stopwatch,
    accumulated: Duration,
    elapsed_ticks: u32,
}

impl Clock {
    /// 50 ticks per second.
    pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(20);

    pub fn new(tick_rate: Duration) -> Self {
        Self {
            tick_rate: non_zero_or_default(tick_rate),
            stopwatch: Stopwatch::default(),
            accumulated: Duration::ZERO,
            elapsed_ticks: 0,
        }
    }

    /// Drop any accumulated time and start measuring from `now`.
    pub fn reset(&mut self, now: Duration) {
        self.stopwatch = Stopwatch::starting_at(now);
        self.accumulated = Duration::ZERO;
        self.elapsed_ticks = 0;
    }

    pub fn update(&mut self, now: Duration) {
        self.accumulated += self.stopwatch.lap(now);
        let ticks = self.accumulated.as_nanos() / self.tick_rate.as_nanos();
        let ticks = u32::try_from(ticks).unwrap_or(u32::MAX);
        self.accumulated -= self.tick_rate * ticks;
        self.elapsed_ticks = ticks;
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Time accumulated towards the next tick.
    pub fn remainder(&self) -> Duration {
        self.accumulated
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    pub fn set_tick_rate(&mut self, tick_rate: Duration) {
        self.tick_rate = non_zero_or_default(tick_rate);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK_RATE)
    }
}

fn non_zero_or_default(tick_rate: Duration) -> Duration {
    if tick_rate.is_zero() {
        log::warn!("Tick rate must be non-zero, using {:?}", Clock::DEFAULT_TICK_RATE);
        Clock::DEFAULT_TICK_RATE
    } else {
        tick_rate
    }
}

/// Frame timing resource, refreshed by the core at the start of every frame.
#[derive(Clone, Copy, Debug)]
pub struct Time {
    stopwatch: Stopwatch,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    fps: f32,
}

impl Time {
    const FPS_SMOOTHING: f32 = 0.1;

    pub(crate) fn new(now: Duration) -> Self {
        Self {
            stopwatch: Stopwatch::starting_at(now),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub(crate) fn update(&mut self, now: Duration) {
        self.delta = self.stopwatch.lap(now);
        self.elapsed += self.delta;
        self.frame_count += 1;

        let secs = self.delta.as_secs_f32();
        if secs > 0.0 {
            let instant = 1.0 / secs;
            self.fps = if self.fps == 0.0 {
                instant
            } else {
                self.fps + (instant - self.fps) * Self::FPS_SMOOTHING
            };
        }
    }

    /// Time between the start of the previous frame and this one.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Frames started so far, including the current one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Exponentially smoothed frames per second.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn manual_source_only_moves_when_advanced() {
        let source = TimeSource::manual();
        assert_eq!(source.now(), Duration::ZERO);
        let shared = source.clone();
        shared.advance(ms(250));
        assert_eq!(source.now(), ms(250));
        assert!(source.is_manual());
    }

    #[test]
    fn clock_accumulates_remainders() {
        let mut clock = Clock::new(ms(200));
        clock.reset(Duration::ZERO);

        clock.update(ms(200));
        assert_eq!(clock.elapsed_ticks(), 1);
        clock.update(ms(600));
        assert_eq!(clock.elapsed_ticks(), 2);
        clock.update(ms(700));
        assert_eq!(clock.elapsed_ticks(), 0);
        assert_eq!(clock.remainder(), ms(100));
        clock.update(ms(800));
        assert_eq!(clock.elapsed_ticks(), 1);
        clock.update(ms(1300));
        assert_eq!(clock.elapsed_ticks(), 2);
        assert_eq!(clock.remainder(), ms(100));
    }

    #[test]
    fn zero_tick_rate_falls_back_to_default() {
        let mut clock = Clock::new(Duration::ZERO);
        assert_eq!(clock.tick_rate(), Clock::DEFAULT_TICK_RATE);
        clock.set_tick_rate(ms(5));
        assert_eq!(clock.tick_rate(), ms(5));
    }

    #[test]
    fn time_tracks_frames() {
        let mut time = Time::new(Duration::ZERO);
        time.update(ms(100));
        assert_eq!(time.delta(), ms(100));
        assert_eq!(time.frame_count(), 1);
        assert!((time.fps() - 10.0).abs() < 1e-3);

        time.update(ms(150));
        assert_eq!(time.delta(), ms(50));
        assert_eq!(time.elapsed(), ms(150));
        assert!(time.fps() > 10.0 && time.fps() < 20.0);
    }
}
