// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition records and their lifecycle state machine.
//!
//! A *transition* is one logical travel of an element between a source and a
//! destination anchor. Each has:
//!
//! - An identity ([`TransitionId`]), a generational handle that becomes
//!   stale when the record is torn down, plus its [`TransitionKey`].
//! - A lifecycle [`Phase`] driven only by edges
//!   ([`begin`](TransitionStore::begin), [`end`](TransitionStore::end),
//!   [`drive`](TransitionStore::drive)) and by the passage of time observed
//!   through [`evaluate`](TransitionStore::evaluate).
//! - Options ([`TransitionOptions`]) fixing its animation, corners, opacity
//!   ramp and source-hiding behavior.
//!
//! # Groups
//!
//! Records sharing a [`GroupId`] keep stable insertion order; the first is
//! the coordinator. Every member advances in the same `evaluate` pass, member
//! `i` starts `i * stagger` after the base delay, and only the coordinator's
//! completion fires, once per forward and once per reverse run of the whole
//! group. A group's records are torn down together once all of them have
//! returned to 0.
//!
//! # Dirty tracking
//!
//! Mutations mark the channels in [`dirty`](crate::dirty): progress moves
//! mark **PROGRESS**, phase changes mark **VISIBILITY** (which propagates
//! from a coordinator to its members), committed anchor changes mark
//! **GEOMETRY** via [`mark_geometry`](TransitionStore::mark_geometry), and
//! creation marks **LIFECYCLE**.
//!
//! [`TransitionKey`]: crate::anchor::TransitionKey

mod evaluate;
mod frame;
mod id;
mod record;
mod store;

pub use evaluate::{CompletionReport, EdgeReport, PhaseChange, TransitionChanges};
pub use frame::{FloatingFrame, TransitionFrame};
pub use id::{GroupId, TransitionId};
pub use record::{
    Completion, CornerSpec, OpacityRamp, Phase, TransitionOptions, TransitionRecord,
};
pub use store::TransitionStore;
