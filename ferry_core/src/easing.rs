// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing curves for eased runs.
//!
//! An [`Easing`] maps normalized run time `t ∈ [0, 1]` to a normalized value.
//! Every curve returns exactly 0 at `t = 0` and exactly 1 at `t = 1`, so a run
//! always lands on its target regardless of the curve. Springs may overshoot
//! in between.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::geometry::clamp01;

/// A timing curve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Slow start (cubic).
    EaseIn,
    /// Slow end (cubic).
    EaseOut,
    /// Slow start and end (cubic).
    #[default]
    EaseInOut,
    /// CSS-style cubic Bézier with control points `(x1, y1)` and `(x2, y2)`.
    ///
    /// `x1` and `x2` are clamped to `[0, 1]` so the curve stays a function of
    /// time.
    CubicBezier {
        /// First control point, x.
        x1: f64,
        /// First control point, y.
        y1: f64,
        /// Second control point, x.
        x2: f64,
        /// Second control point, y.
        y2: f64,
    },
    /// Damped harmonic oscillator, normalized so that it has visually settled
    /// by the end of the run.
    ///
    /// `damping_fraction` is clamped to `[0.05, 1]`; `1` is critically
    /// damped (no overshoot).
    Spring {
        /// Damping ratio ζ.
        damping_fraction: f64,
    },
}

/// Residual amplitude at which a spring counts as settled.
const SPRING_SETTLE_EPSILON: f64 = 1e-3;

impl Easing {
    /// Evaluates the curve at normalized time `t` (clamped to `[0, 1]`).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = clamp01(t);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Self::CubicBezier { x1, y1, x2, y2 } => {
                let curve = UnitBezier::new(clamp01(x1), y1, clamp01(x2), y2);
                curve.solve(t)
            }
            Self::Spring { damping_fraction } => spring(t, damping_fraction),
        }
    }
}

/// Spring response at normalized time `t`.
///
/// The natural frequency is chosen so that the decay envelope falls below
/// [`SPRING_SETTLE_EPSILON`] at `t = 1`. A NaN damping fraction behaves as
/// critically damped.
fn spring(t: f64, damping_fraction: f64) -> f64 {
    let zeta = if damping_fraction.is_nan() {
        1.0
    } else {
        damping_fraction.clamp(0.05, 1.0)
    };
    let decay_total = -SPRING_SETTLE_EPSILON.ln();
    if zeta >= 1.0 {
        // Critically damped: x(t) = 1 - e^(-ω₀t) (1 + ω₀t). The extra factor
        // accounts for the polynomial term slowing the envelope down.
        let omega = decay_total * 1.4;
        let decay = (-omega * t).exp();
        return 1.0 - decay * (1.0 + omega * t);
    }
    let omega = decay_total / zeta;
    let root = (1.0 - zeta * zeta).sqrt();
    let omega_d = omega * root;
    let decay = (-zeta * omega * t).exp();
    1.0 - decay * ((omega_d * t).cos() + (zeta / root) * (omega_d * t).sin())
}

/// Cubic Bézier through `(0, 0)` and `(1, 1)`, in polynomial form.
#[derive(Clone, Copy, Debug)]
struct UnitBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl UnitBezier {
    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        let ay = 1.0 - cy - by;
        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    fn sample_x(&self, s: f64) -> f64 {
        ((self.ax * s + self.bx) * s + self.cx) * s
    }

    fn sample_y(&self, s: f64) -> f64 {
        ((self.ay * s + self.by) * s + self.cy) * s
    }

    fn sample_dx(&self, s: f64) -> f64 {
        (3.0 * self.ax * s + 2.0 * self.bx) * s + self.cx
    }

    /// Finds the curve parameter for time `x`, then returns the curve value.
    fn solve(&self, x: f64) -> f64 {
        const EPSILON: f64 = 1e-7;

        // Newton-Raphson first; it converges in a handful of steps for
        // well-behaved curves.
        let mut s = x;
        for _ in 0..8 {
            let err = self.sample_x(s) - x;
            if err.abs() < EPSILON {
                return self.sample_y(s);
            }
            let d = self.sample_dx(s);
            if d.abs() < 1e-6 {
                break;
            }
            s -= err / d;
        }

        // Bisection fallback for flat regions.
        let (mut lo, mut hi) = (0.0, 1.0);
        s = x;
        while hi - lo > EPSILON {
            let v = self.sample_x(s);
            if (v - x).abs() < EPSILON {
                break;
            }
            if v < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        self.sample_y(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::CubicBezier {
            x1: 0.25,
            y1: 0.1,
            x2: 0.25,
            y2: 1.0,
        },
        Easing::Spring {
            damping_fraction: 0.7,
        },
        Easing::Spring {
            damping_fraction: 1.0,
        },
    ];

    #[test]
    fn endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
            assert_eq!(easing.apply(-3.0), 0.0, "{easing:?} below range");
            assert_eq!(easing.apply(7.0), 1.0, "{easing:?} above range");
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let e = Easing::EaseInOut;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-12);
        for t in [0.1, 0.2, 0.35] {
            assert!((e.apply(t) + e.apply(1.0 - t) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn linear_bezier_is_identity() {
        let e = Easing::CubicBezier {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        for t in [0.1, 0.33, 0.5, 0.8] {
            assert!((e.apply(t) - t).abs() < 1e-5, "bezier diverged at {t}");
        }
    }

    #[test]
    fn bezier_ease_is_monotonic() {
        let e = Easing::CubicBezier {
            x1: 0.42,
            y1: 0.0,
            x2: 0.58,
            y2: 1.0,
        };
        let mut last = 0.0;
        for i in 1..100 {
            let v = e.apply(f64::from(i) / 100.0);
            assert!(v >= last - 1e-9, "bezier decreased at step {i}");
            last = v;
        }
    }

    #[test]
    fn underdamped_spring_overshoots_and_settles() {
        let e = Easing::Spring {
            damping_fraction: 0.4,
        };
        let peak = (1..100)
            .map(|i| e.apply(f64::from(i) / 100.0))
            .fold(0.0_f64, f64::max);
        assert!(peak > 1.0, "expected overshoot, peak {peak}");
        assert!((e.apply(0.99) - 1.0).abs() < 0.01);
    }

    #[test]
    fn nan_damping_acts_critically_damped() {
        let nan = Easing::Spring {
            damping_fraction: f64::NAN,
        };
        let critical = Easing::Spring {
            damping_fraction: 1.0,
        };
        for i in 1..10 {
            let t = f64::from(i) / 10.0;
            assert!(nan.apply(t).is_finite(), "NaN sample at {t}");
            assert_eq!(nan.apply(t), critical.apply(t));
        }
    }

    #[test]
    fn critical_spring_does_not_overshoot() {
        let e = Easing::Spring {
            damping_fraction: 1.0,
        };
        for i in 1..100 {
            let v = e.apply(f64::from(i) / 100.0);
            assert!(v <= 1.0, "critical spring overshot at step {i}: {v}");
        }
    }
}
