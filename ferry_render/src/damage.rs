// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use kurbo::Rect;

/// A region of the overlay that needs re-rendering.
///
/// Hosts can use this to redraw only the areas a floating copy left or
/// entered, or where a source or destination changed visibility.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire overlay needs redrawing.
    #[default]
    Full,
    /// Rectangles that need redrawing, in overlay coordinates.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds one rectangle. Empty rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if rect.area() <= 0.0 {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(rect),
            Self::None => *self = Self::Rects(alloc::vec![rect]),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Smallest rectangle covering the damage, if bounded.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Full | Self::None => None,
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_promotes_none_and_skips_empty_rects() {
        let mut damage = DamageRegion::None;
        damage.add(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(damage.is_empty());
        damage.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(damage, DamageRegion::Rects(alloc::vec![Rect::new(0.0, 0.0, 10.0, 10.0)]));
    }

    #[test]
    fn merge_with_full_is_full() {
        let mut damage = DamageRegion::Rects(alloc::vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
        damage.merge(&DamageRegion::Full);
        assert_eq!(damage, DamageRegion::Full);
        assert_eq!(damage.bounds(), None);
    }

    #[test]
    fn bounds_unions_rects() {
        let mut damage = DamageRegion::None;
        damage.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        damage.merge(&DamageRegion::Rects(alloc::vec![Rect::new(20.0, 5.0, 30.0, 40.0)]));
        assert_eq!(damage.bounds(), Some(Rect::new(0.0, 0.0, 30.0, 40.0)));
    }
}
