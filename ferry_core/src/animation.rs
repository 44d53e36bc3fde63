// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation specifications and eased runs.
//!
//! An [`AnimationSpec`] is the caller-facing description of *how* progress
//! should move (curve, duration, start delay). A [`Run`] is one concrete
//! movement of a progress value from `from` to `to`, anchored at a start time.
//! Runs are sampled with the frame's [`HostTime`]; nothing here reads a clock.
//!
//! Redirecting an in-flight run never snaps: a new run is started from the
//! value the old one had reached, so direction changes are continuous.

use crate::easing::Easing;
use crate::geometry::lerp;
use crate::time::{Duration, HostTime};

/// How a progress value animates toward a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    /// Timing curve.
    pub easing: Easing,
    /// Nominal run length.
    pub duration: Duration,
    /// Delay between the triggering edge and the start of the run.
    pub delay: Duration,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self::smooth()
    }
}

impl AnimationSpec {
    /// Ease-in-out over 350 ms; the default for cross-hierarchy flights.
    #[must_use]
    pub const fn smooth() -> Self {
        Self {
            easing: Easing::EaseInOut,
            duration: Duration::from_millis(350),
            delay: Duration::ZERO,
        }
    }

    /// Ease-out over 220 ms.
    #[must_use]
    pub const fn snappy() -> Self {
        Self {
            easing: Easing::EaseOut,
            duration: Duration::from_millis(220),
            delay: Duration::ZERO,
        }
    }

    /// Short ease-out used when a scroll gesture ends between 0 and 1.
    #[must_use]
    pub const fn snap_back() -> Self {
        Self {
            easing: Easing::EaseOut,
            duration: Duration::from_millis(150),
            delay: Duration::ZERO,
        }
    }

    /// A spring that settles within `duration`.
    #[must_use]
    pub const fn spring(duration: Duration, damping_fraction: f64) -> Self {
        Self {
            easing: Easing::Spring { damping_fraction },
            duration,
            delay: Duration::ZERO,
        }
    }

    /// Constant velocity over `duration`.
    #[must_use]
    pub const fn linear(duration: Duration) -> Self {
        Self {
            easing: Easing::Linear,
            duration,
            delay: Duration::ZERO,
        }
    }

    /// Returns a copy with the given start delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns a copy with the given duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns a copy with the given curve.
    #[must_use]
    pub const fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A value sampled from a [`Run`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSample {
    /// Current value.
    pub value: f64,
    /// Whether the run has started (its delay elapsed).
    pub started: bool,
    /// Whether the run has reached its target.
    pub finished: bool,
}

/// One eased movement of a value from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Run {
    /// Value at the start of the run.
    pub from: f64,
    /// Target value.
    pub to: f64,
    /// When the run starts moving (delay already applied).
    pub start: HostTime,
    /// Nominal length of the run.
    pub duration: Duration,
    /// Timing curve.
    pub easing: Easing,
}

impl Run {
    /// Creates a run that starts moving after `spec.delay` (plus `extra_delay`).
    #[must_use]
    pub fn new(
        from: f64,
        to: f64,
        now: HostTime,
        spec: AnimationSpec,
        extra_delay: Duration,
    ) -> Self {
        Self {
            from,
            to,
            start: now + spec.delay + extra_delay,
            duration: spec.duration,
            easing: spec.easing,
        }
    }

    /// Creates a run that starts moving at `now`, ignoring the spec's delay.
    ///
    /// Used to redirect an in-flight value.
    #[must_use]
    pub fn immediate(from: f64, to: f64, now: HostTime, spec: AnimationSpec) -> Self {
        Self {
            from,
            to,
            start: now,
            duration: spec.duration,
            easing: spec.easing,
        }
    }

    /// Time at which the run reaches its target.
    #[must_use]
    pub fn end(&self) -> HostTime {
        self.start + self.duration
    }

    /// Samples the run at `now`.
    #[must_use]
    pub fn sample(&self, now: HostTime) -> RunSample {
        if now < self.start {
            return RunSample {
                value: self.from,
                started: false,
                finished: false,
            };
        }
        if self.duration.is_zero() || now >= self.end() {
            return RunSample {
                value: self.to,
                started: true,
                finished: true,
            };
        }
        let elapsed = (now - self.start).as_secs_f64();
        let t = elapsed / self.duration.as_secs_f64();
        RunSample {
            value: lerp(self.from, self.to, self.easing.apply(t)),
            started: true,
            finished: false,
        }
    }

    /// Returns `true` if the run moves toward a larger value.
    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.to >= self.from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> HostTime {
        HostTime(Duration::from_millis(v).nanos())
    }

    #[test]
    fn run_holds_start_value_during_delay() {
        let spec =
            AnimationSpec::linear(Duration::from_millis(100)).with_delay(Duration::from_millis(50));
        let run = Run::new(0.0, 1.0, ms(0), spec, Duration::from_millis(25));
        let s = run.sample(ms(60));
        assert_eq!(s.value, 0.0);
        assert!(!s.started);
        assert_eq!(run.start, ms(75));
    }

    #[test]
    fn linear_run_midpoint_and_end() {
        let spec = AnimationSpec::linear(Duration::from_millis(200));
        let run = Run::new(0.0, 1.0, ms(0), spec, Duration::ZERO);
        let mid = run.sample(ms(100));
        assert!((mid.value - 0.5).abs() < 1e-9);
        assert!(mid.started && !mid.finished);
        let end = run.sample(ms(200));
        assert_eq!(end.value, 1.0);
        assert!(end.finished);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let run = Run::immediate(0.3, 0.0, ms(10), AnimationSpec::linear(Duration::ZERO));
        let s = run.sample(ms(10));
        assert!(s.finished);
        assert_eq!(s.value, 0.0);
    }

    #[test]
    fn reverse_run_from_partial_progress() {
        let spec = AnimationSpec::linear(Duration::from_millis(100));
        let run = Run::immediate(0.3, 0.0, ms(0), spec);
        assert!(!run.is_forward());
        let s = run.sample(ms(50));
        assert!((s.value - 0.15).abs() < 1e-9);
    }
}
