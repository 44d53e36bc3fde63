// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque handles for host-managed content.

use core::fmt;

/// A host-managed layer that can be drawn as the floating copy.
///
/// Surfaces are created and owned by the host (a duplicated view, a
/// texture, a native layer). The plan passes them through without
/// interpretation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// An opaque handle to a live source view that a mirroring backend can
/// reproduce elsewhere.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceHandle(pub u64);

impl fmt::Debug for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceHandle({:#x})", self.0)
    }
}
