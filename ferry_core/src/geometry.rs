// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure interpolation helpers.
//!
//! Everything in this module is stateless and cheap enough to call for every
//! transition on every frame. Degenerate inputs never produce NaN:
//!
//! - a zero (or negative) progress range counts as "fully transitioned";
//! - a source with a non-positive width or height scales by identity, so a
//!   floating copy never pops before its first real layout.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Clamps `t` to `[0, 1]`, mapping NaN to 0.
#[inline]
#[must_use]
pub fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Linear interpolation between `a` and `b`.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Maps a scroll offset to transition progress.
///
/// Returns 0 while `offset < start_at`. A `range` of zero (or less) returns 1.
/// Otherwise the result is `(offset - start_at) / range` clamped to `[0, 1]`.
#[must_use]
pub fn progress(offset: f64, start_at: f64, range: f64) -> f64 {
    if offset < start_at {
        return 0.0;
    }
    if range <= 0.0 {
        return 1.0;
    }
    clamp01((offset - start_at) / range)
}

/// Interpolates between the centers of `src` and `dst`.
///
/// `extra_offset_x` is added to the horizontal component, typically the
/// output of [`dynamic_offset`].
#[must_use]
pub fn position(src: Rect, dst: Rect, t: f64, extra_offset_x: f64) -> Point {
    let a = src.center();
    let b = dst.center();
    Point::new(lerp(a.x, b.x, t) + extra_offset_x, lerp(a.y, b.y, t))
}

/// Non-uniform scale that takes `src` to the interpolated size at `t`.
///
/// Returns `(1, 1)` when `src` has a non-positive dimension.
#[must_use]
pub fn scale(src: Size, dst: Size, t: f64) -> Vec2 {
    if src.width <= 0.0 || src.height <= 0.0 {
        return Vec2::new(1.0, 1.0);
    }
    Vec2::new(
        lerp(src.width, dst.width, t) / src.width,
        lerp(src.height, dst.height, t) / src.height,
    )
}

/// Sideways nudge along a half sine arc.
///
/// Zero at `t = 0` and `t = 1`, `base` at `t = 0.5`. Used to steer a moving
/// element around a sibling it would otherwise cross mid-flight.
#[must_use]
pub fn dynamic_offset(t: f64, base: f64) -> f64 {
    base * (t * core::f64::consts::PI).sin()
}

/// Interpolated geometry of a floating copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolated {
    /// Center of the floating copy.
    pub center: Point,
    /// Scale relative to the source size.
    pub scale: Vec2,
    /// Untransformed size of the floating copy (the source size).
    pub size: Size,
}

impl Interpolated {
    /// Returns the on-screen rectangle covered by the floating copy.
    ///
    /// With a degenerate source this is the source rectangle moved to
    /// `center`.
    #[must_use]
    pub fn rect(&self) -> Rect {
        let size = Size::new(
            self.size.width * self.scale.x,
            self.size.height * self.scale.y,
        );
        Rect::from_center_size(self.center, size)
    }

    /// Returns the affine transform placing a copy laid out at the origin
    /// with [`size`](Self::size) onto [`rect`](Self::rect).
    #[must_use]
    pub fn transform(&self) -> Affine {
        let half = Vec2::new(self.size.width * 0.5, self.size.height * 0.5);
        Affine::translate(self.center.to_vec2())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-half)
    }
}

/// Computes position and scale of a floating copy travelling from `src` to
/// `dst`.
#[must_use]
pub fn interpolate(src: Rect, dst: Rect, t: f64, extra_offset_x: f64) -> Interpolated {
    let t = clamp01(t);
    Interpolated {
        center: position(src, dst, t, extra_offset_x),
        scale: scale(src.size(), dst.size(), t),
        size: src.size(),
    }
}

/// Linear interpolation between two rectangles, edge by edge.
#[must_use]
pub fn lerp_rect(src: Rect, dst: Rect, t: f64) -> Rect {
    Rect::new(
        lerp(src.x0, dst.x0, t),
        lerp(src.y0, dst.y0, t),
        lerp(src.x1, dst.x1, t),
        lerp(src.y1, dst.y1, t),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn progress_is_zero_before_start() {
        for offset in [-1000.0, -21.0, -20.000_001] {
            assert_eq!(progress(offset, -20.0, 40.0), 0.0);
        }
    }

    #[test]
    fn zero_range_is_fully_transitioned() {
        for offset in [0.0, 5.0, 1e9] {
            let p = progress(offset, 0.0, 0.0);
            assert_eq!(p, 1.0);
        }
        // Before the start offset the start guard still wins.
        assert_eq!(progress(-1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn progress_is_monotonic() {
        let mut last = 0.0;
        let mut offset = -100.0;
        while offset < 200.0 {
            let p = progress(offset, -20.0, 40.0);
            assert!(p >= last, "progress decreased at offset {offset}");
            assert!((0.0..=1.0).contains(&p), "progress {p} out of range");
            last = p;
            offset += 0.5;
        }
    }

    #[test]
    fn progress_example_value() {
        assert!((progress(0.0, -20.0, 40.0) - 0.5).abs() < EPS);
    }

    #[test]
    fn position_example_value() {
        let src = Rect::new(0.0, 0.0, 100.0, 100.0);
        let dst = Rect::from_origin_size((200.0, 400.0), (50.0, 50.0));
        let p = position(src, dst, 0.5, 0.0);
        assert!((p.x - 137.5).abs() < EPS);
        assert!((p.y - 237.5).abs() < EPS);
    }

    #[test]
    fn identical_rects_never_move() {
        let r = Rect::new(10.0, 20.0, 70.0, 45.0);
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert_eq!(position(r, r, t, 0.0), r.center());
        }
    }

    #[test]
    fn extra_offset_only_moves_x() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let p = position(r, r, 0.3, 7.0);
        assert_eq!(p, Point::new(12.0, 5.0));
    }

    #[test]
    fn scale_endpoints() {
        let src = Size::new(100.0, 40.0);
        let dst = Size::new(50.0, 80.0);
        assert_eq!(scale(src, dst, 0.0), Vec2::new(1.0, 1.0));
        let end = scale(src, dst, 1.0);
        assert!((end.x - 0.5).abs() < EPS);
        assert!((end.y - 2.0).abs() < EPS);
    }

    #[test]
    fn scale_example_value() {
        let s = scale(Size::new(100.0, 100.0), Size::new(50.0, 50.0), 0.5);
        assert!((s.x - 0.75).abs() < EPS);
        assert!((s.y - 0.75).abs() < EPS);
    }

    #[test]
    fn degenerate_source_scales_by_identity() {
        let dst = Size::new(300.0, 200.0);
        for src in [Size::ZERO, Size::new(0.0, 10.0), Size::new(10.0, -1.0)] {
            for t in [0.0, 0.5, 1.0] {
                assert_eq!(scale(src, dst, t), Vec2::new(1.0, 1.0));
            }
        }
    }

    #[test]
    fn dynamic_offset_arc() {
        for k in [-30.0, 0.0, 12.5, 80.0] {
            assert!(dynamic_offset(0.0, k).abs() < EPS);
            assert!(dynamic_offset(1.0, k).abs() < 1e-6);
            assert!((dynamic_offset(0.5, k) - k).abs() < EPS);
        }
    }

    #[test]
    fn interpolated_rect_matches_endpoints() {
        let src = Rect::new(0.0, 0.0, 100.0, 100.0);
        let dst = Rect::from_origin_size((200.0, 400.0), (50.0, 50.0));
        let start = interpolate(src, dst, 0.0, 0.0).rect();
        let end = interpolate(src, dst, 1.0, 0.0).rect();
        assert!((start.x0 - src.x0).abs() + (start.y1 - src.y1).abs() < EPS);
        assert!((end.x0 - dst.x0).abs() + (end.y1 - dst.y1).abs() < EPS);
    }

    #[test]
    fn transform_maps_source_onto_rect() {
        let src = Rect::new(0.0, 0.0, 100.0, 60.0);
        let dst = Rect::new(300.0, 300.0, 350.0, 330.0);
        let geo = interpolate(src, dst, 0.5, 0.0);
        let mapped = geo
            .transform()
            .transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, geo.size));
        let expected = geo.rect();
        assert!((mapped.x0 - expected.x0).abs() < EPS);
        assert!((mapped.y1 - expected.y1).abs() < EPS);
    }

    #[test]
    fn lerp_rect_midpoint() {
        let r = lerp_rect(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(10.0, 10.0, 30.0, 30.0),
            0.5,
        );
        assert_eq!(r, Rect::new(5.0, 5.0, 20.0, 20.0));
    }
}
