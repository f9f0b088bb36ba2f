//! Frame timing, frame statistics and event coalescing.
//!
//! All types take `instant::Instant` so they behave the same on wasm, where
//! `std::time::Instant` is unavailable.

use std::time::Duration;

use instant::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces the elapsed time between consecutive frames.
///
/// Delta time is clamped so a stalled or backgrounded window does not make spinning
/// objects jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::ZERO, Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the baseline, e.g. once initialisation has finished.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`. A `now` earlier than the previous tick yields zero.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let elapsed = if now > self.last {
            now.duration_since(self.last)
        } else {
            Duration::ZERO
        };
        let dt = elapsed.clamp(self.dt_min, self.dt_max);
        if now > self.last {
            self.last = now;
        }

        let frame = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesces bursts of events: only the last value is released, and only once nothing
/// new arrived for the quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Takes the pending value if its quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now >= *at + self.quiet);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}

/// Averages of one completed statistics window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StatsSample {
    /// Frames per second over the window.
    pub fps: f32,
    /// Mean time between `begin` and `end` of a frame, in milliseconds.
    pub ms: f32,
}

/// Frame rate and frame time, published once per window (one second by default).
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: Duration,
    window_start: Instant,
    frame_start: Option<Instant>,
    frames: u32,
    busy: Duration,
    last: Option<StatsSample>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::starting_at(Duration::from_secs(1), Instant::now())
    }

    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            frame_start: None,
            frames: 0,
            busy: Duration::ZERO,
            last: None,
        }
    }

    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    pub fn begin_at(&mut self, now: Instant) {
        self.frame_start = Some(now);
    }

    pub fn end(&mut self) -> Option<StatsSample> {
        self.end_at(Instant::now())
    }

    /// Closes the current frame. Returns the window's averages when `now` completes it.
    pub fn end_at(&mut self, now: Instant) -> Option<StatsSample> {
        let start = self.frame_start.take().unwrap_or(now);
        self.busy += since(start, now);
        self.frames += 1;

        let elapsed = since(self.window_start, now);
        if elapsed < self.window {
            return None;
        }

        let sample = StatsSample {
            fps: self.frames as f32 / elapsed.as_secs_f32(),
            ms: self.busy.as_secs_f32() * 1000.0 / self.frames as f32,
        };
        self.window_start = now;
        self.frames = 0;
        self.busy = Duration::ZERO;
        self.last = Some(sample);
        Some(sample)
    }

    /// The most recently completed window, if any.
    pub fn last(&self) -> Option<StatsSample> {
        self.last
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

fn since(earlier: Instant, now: Instant) -> Duration {
    if now > earlier {
        now.duration_since(earlier)
    } else {
        Duration::ZERO
    }
}
