// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the transition engine.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! frame-loop instrumentation calls as passes commit, edges arrive, phases
//! change and completions fire. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! The engine itself never holds a tracer. Operations report what happened
//! in their return values ([`PassSummary`], [`TransitionChanges`],
//! [`Snap`]), and the frame loop forwards those to the tracer, typically via
//! [`TransitionChanges::emit`].
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`FrameGeometryEvent`] and the
//!   corresponding `TraceSink` method.
//!
//! [`TransitionChanges`]: crate::transition::TransitionChanges
//! [`TransitionChanges::emit`]: crate::transition::TransitionChanges::emit
//! [`Snap`]: crate::progress::Snap

use crate::progress::Snap;
use crate::registry::PassSummary;
use crate::time::HostTime;
use crate::transition::{GroupId, Phase, TransitionId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction of a transition edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward progress 1.
    Forward,
    /// Toward progress 0.
    Reverse,
}

/// Why a rendering strategy was replaced by a simpler one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// The mirroring backend reported itself unavailable.
    MirroringUnavailable,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after an anchor pass is committed.
#[derive(Clone, Copy, Debug)]
pub struct PassCommitEvent {
    /// Host time of the commit.
    pub time: HostTime,
    /// Revision of the committed snapshot.
    pub revision: u64,
    /// Identities published during the pass.
    pub published: u32,
    /// Retained identities carried over.
    pub carried: u32,
    /// Keys whose anchors changed.
    pub changed: u32,
}

impl PassCommitEvent {
    /// Builds an event from a [`PassSummary`].
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "anchor counts are capped at u32::MAX for tracing"
    )]
    pub fn new(time: HostTime, summary: &PassSummary) -> Self {
        let cap = |n: usize| n.min(u32::MAX as usize) as u32;
        Self {
            time,
            revision: summary.revision.0,
            published: cap(summary.published),
            carried: cap(summary.carried),
            changed: cap(summary.changed_keys.len()),
        }
    }
}

/// Emitted when an activation or deactivation edge reaches a record.
#[derive(Clone, Copy, Debug)]
pub struct EdgeEvent<'a> {
    /// Host time of the edge.
    pub time: HostTime,
    /// Record handle.
    pub id: TransitionId,
    /// Record key.
    pub key: &'a str,
    /// Group the record belongs to, if any.
    pub group: Option<GroupId>,
    /// Direction of the new run.
    pub direction: Direction,
    /// Progress at which the new run starts.
    pub from_progress: f64,
    /// Whether an in-flight run was redirected rather than a new one started.
    pub redirected: bool,
}

/// Emitted when a record changes lifecycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseChangeEvent<'a> {
    /// Host time of the evaluation that observed the change.
    pub time: HostTime,
    /// Record handle.
    pub id: TransitionId,
    /// Record key.
    pub key: &'a str,
    /// Previous phase.
    pub from: Phase,
    /// New phase.
    pub to: Phase,
}

/// Emitted when a completion callback fires.
#[derive(Clone, Copy, Debug)]
pub struct CompletionEvent<'a> {
    /// Host time of the evaluation that fired it.
    pub time: HostTime,
    /// Key of the record whose callback fired (the coordinator for groups).
    pub key: &'a str,
    /// Group, if the completion covers a whole group.
    pub group: Option<GroupId>,
    /// `true` after a forward run, `false` after a reverse run.
    pub finished: bool,
}

/// Emitted when a scroll gesture ends and progress snaps.
#[derive(Clone, Copy, Debug)]
pub struct ScrollSnapEvent {
    /// Host time at which the snap started.
    pub time: HostTime,
    /// Progress when the gesture ended.
    pub from_progress: f64,
    /// Snap target (0 or 1).
    pub target: f64,
}

impl From<&Snap> for ScrollSnapEvent {
    fn from(snap: &Snap) -> Self {
        Self {
            time: snap.started_at,
            from_progress: snap.from,
            target: snap.target,
        }
    }
}

/// Emitted when a rendering strategy falls back.
#[derive(Clone, Copy, Debug)]
pub struct StrategyFallbackEvent<'a> {
    /// Key of the transition whose strategy fell back.
    pub key: &'a str,
    /// Why.
    pub reason: FallbackReason,
}

/// Per-frame interpolated geometry of one floating copy.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct FrameGeometryEvent<'a> {
    /// Host time of the frame.
    pub time: HostTime,
    /// Record key.
    pub key: &'a str,
    /// Current progress.
    pub progress: f64,
    /// On-screen rectangle of the floating copy.
    pub rect: kurbo::Rect,
    /// Floating copy opacity.
    pub opacity: f64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine's frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after an anchor pass commits.
    fn on_pass_commit(&mut self, e: &PassCommitEvent) {
        _ = e;
    }

    /// Called when a forward edge reaches a record.
    fn on_transition_begin(&mut self, e: &EdgeEvent<'_>) {
        _ = e;
    }

    /// Called when a reverse edge reaches a record.
    fn on_transition_end(&mut self, e: &EdgeEvent<'_>) {
        _ = e;
    }

    /// Called when a record changes phase.
    fn on_phase_change(&mut self, e: &PhaseChangeEvent<'_>) {
        _ = e;
    }

    /// Called when a completion callback fires.
    fn on_completion(&mut self, e: &CompletionEvent<'_>) {
        _ = e;
    }

    /// Called when a scroll gesture ends with a snap.
    fn on_scroll_snap(&mut self, e: &ScrollSnapEvent) {
        _ = e;
    }

    /// Called when a rendering strategy falls back.
    fn on_strategy_fallback(&mut self, e: &StrategyFallbackEvent<'_>) {
        _ = e;
    }

    /// Called with per-frame floating geometry (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_frame_geometry(&mut self, e: &FrameGeometryEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method forwarding one event to the sink.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident, $sink_method:ident, $event:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$sink_method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`PassCommitEvent`].
        pass_commit,
        on_pass_commit,
        PassCommitEvent
    );
    forward!(
        /// Emits a forward [`EdgeEvent`].
        transition_begin,
        on_transition_begin,
        EdgeEvent<'_>
    );
    forward!(
        /// Emits a reverse [`EdgeEvent`].
        transition_end,
        on_transition_end,
        EdgeEvent<'_>
    );
    forward!(
        /// Emits a [`PhaseChangeEvent`].
        phase_change,
        on_phase_change,
        PhaseChangeEvent<'_>
    );
    forward!(
        /// Emits a [`CompletionEvent`].
        completion,
        on_completion,
        CompletionEvent<'_>
    );
    forward!(
        /// Emits a [`ScrollSnapEvent`].
        scroll_snap,
        on_scroll_snap,
        ScrollSnapEvent
    );
    forward!(
        /// Emits a [`StrategyFallbackEvent`].
        strategy_fallback,
        on_strategy_fallback,
        StrategyFallbackEvent<'_>
    );

    /// Emits a [`FrameGeometryEvent`] (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn frame_geometry(&mut self, e: &FrameGeometryEvent<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_frame_geometry(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
