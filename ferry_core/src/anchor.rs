// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor identity and geometry types.

use alloc::string::{String, ToString};
use core::fmt;

use kurbo::Rect;

/// Opaque name scoping a family of anchors and one transition record.
///
/// Keys are compared by value. Uniqueness is the caller's responsibility:
/// two unrelated elements published under the same key are treated as one
/// transition.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionKey(String);

impl TransitionKey {
    /// Creates a key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a key from an item identity, via its `Display` form.
    #[must_use]
    pub fn from_item(item: &impl fmt::Display) -> Self {
        Self(item.to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionKey({:?})", self.0)
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransitionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TransitionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which end of a transition an anchor marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Where the element starts (e.g. the grid thumbnail).
    Source,
    /// Where the element ends up (e.g. the detail view).
    Destination,
}

/// Which part of an element an anchor describes.
///
/// Simple flights use [`Slot::Content`]. Header morphs publish several slots
/// per key so that a title and its accessory can travel independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// The whole element.
    #[default]
    Content,
    /// A title label.
    Title,
    /// An accessory next to the title (subtitle, badge, button).
    Accessory,
    /// A caller-defined view.
    CustomView,
}

/// Monotonic counter of committed layout passes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(pub u64);

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

/// A captured rectangle tied to a key, a role and a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    /// Transition the anchor belongs to.
    pub key: TransitionKey,
    /// Source or destination.
    pub role: Role,
    /// Which part of the element.
    pub slot: Slot,
    /// Bounds in the shared coordinate space of the transition overlay.
    pub bounds: Rect,
    /// Pass in which these bounds were measured.
    pub captured_at: Revision,
}

impl Anchor {
    /// Returns `true` if `self` has the given identity.
    #[must_use]
    pub fn matches(&self, key: &TransitionKey, role: Role, slot: Slot) -> bool {
        self.role == role && self.slot == slot && self.key == *key
    }
}

/// Source and destination anchors resolved for one key and slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPair {
    /// Source bounds.
    pub source: Rect,
    /// Destination bounds.
    pub destination: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_from_items_use_display() {
        assert_eq!(TransitionKey::from_item(&42_u32), TransitionKey::new("42"));
        assert_eq!(TransitionKey::from("card-1").as_str(), "card-1");
    }

    #[test]
    fn anchor_identity_matching() {
        let anchor = Anchor {
            key: TransitionKey::new("hero"),
            role: Role::Source,
            slot: Slot::Title,
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            captured_at: Revision(3),
        };
        assert!(anchor.matches(&TransitionKey::new("hero"), Role::Source, Slot::Title));
        assert!(!anchor.matches(&TransitionKey::new("hero"), Role::Destination, Slot::Title));
        assert!(!anchor.matches(&TransitionKey::new("hero"), Role::Source, Slot::Content));
    }
}
