// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor-tracked transitions between disconnected parts of a view tree.
//!
//! `ferry_core` lets an element defined once appear to travel continuously
//! between two places rendered by unrelated subtrees (a grid thumbnail
//! flying into a detail view, or a header morphing into a navigation bar
//! title). It is `no_std` compatible (with `alloc`), never reads a clock and
//! never renders; the host supplies time and draws what the store resolves.
//!
//! # Architecture
//!
//! ```text
//!   View subtrees
//!       │ publish(key, role, slot, bounds)
//!       ▼
//!   AnchorRegistry::commit() ──► PassSummary ──► TransitionStore::mark_geometry()
//!       │
//!   Trigger / ItemTrigger ──► Edge ──► TransitionStore::begin() / end()
//!   ScrollController      ──► progress ──► TransitionStore::drive()
//!       │
//!       ▼
//!   TransitionStore::evaluate(now) ──► TransitionChanges ──► Tracer
//!       │
//!       ▼
//!   TransitionStore::frame(id, snapshot) ──► TransitionFrame ──► renderer
//! ```
//!
//! **[`registry`]**: frame-scoped aggregator of anchors published during a
//! layout pass, with order-preserving merge, live-pair selection and
//! retention of anchors for keys with live records.
//!
//! **[`transition`]**: the lifecycle state machine. Records with
//! generational handles, groups with a coordinator and stagger, and
//! per-frame resolution of floating geometry and visibility.
//!
//! **[`progress`]**: edge detectors for trigger-driven transitions and the
//! scroll controller with gesture-end snapping.
//!
//! **[`geometry`]**: pure interpolation helpers (progress ratio, centers,
//! non-uniform scale, arc offset).
//!
//! **[`animation`]** / **[`easing`]**: animation specs, eased runs and timing
//! curves.
//!
//! **[`dirty`]**: channel constants for `understory_dirty` tracking of
//! transition records.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-frame
//!   floating geometry events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod anchor;
pub mod animation;
pub mod dirty;
pub mod easing;
pub mod geometry;
pub mod progress;
pub mod registry;
pub mod time;
pub mod trace;
pub mod transition;
