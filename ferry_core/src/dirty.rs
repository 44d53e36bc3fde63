// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for transition records.
//!
//! The [`TransitionStore`](crate::transition::TransitionStore) marks records
//! on these channels (via [`understory_dirty`]) as they change, and
//! [`evaluate`](crate::transition::TransitionStore::evaluate) drains them into
//! [`TransitionChanges`](crate::transition::TransitionChanges).
//!
//! - **Propagating**: [`VISIBILITY`] has dependency edges from every group
//!   member to the group's coordinator and is marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy). A group-wide visibility
//!   flip is marked once on the coordinator and reaches every member.
//! - **Local-only**: [`PROGRESS`] and [`GEOMETRY`] only report the record
//!   that was marked.
//! - **Structural**: [`LIFECYCLE`] is marked when records are created or
//!   destroyed.

use understory_dirty::Channel;

/// Progress value changed; the floating copy must be re-interpolated.
pub const PROGRESS: Channel = Channel::new(0);

/// Source, destination, or floating-copy visibility changed.
pub const VISIBILITY: Channel = Channel::new(1);

/// Anchors of the record's key moved, appeared or disappeared.
pub const GEOMETRY: Channel = Channel::new(2);

/// A record was created or destroyed.
pub const LIFECYCLE: Channel = Channel::new(3);
