// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition and group identity types.

use core::fmt;

/// A handle to a record in a [`TransitionStore`](super::TransitionStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a record is torn down and its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId {
    /// Slot index into the store's record table.
    pub(crate) idx: u32,
    /// Generation counter; must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl TransitionId {
    /// Returns the raw slot index (for diagnostics and
    /// [`TransitionChanges`](super::TransitionChanges) lookups).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionId({}@gen{})", self.idx, self.generation)
    }
}

/// Caller-chosen identifier grouping transitions that animate together.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}
