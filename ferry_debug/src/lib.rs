// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for ferry
//! diagnostics.
//!
//! This crate provides [`TraceSink`](ferry_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes, one async track per transition key.
//! - [`Tee`]: forwards every event to two sinks.

pub mod chrome;
pub mod pretty;
pub mod recorder;

use ferry_core::trace::{
    CompletionEvent, EdgeEvent, FrameGeometryEvent, PassCommitEvent, PhaseChangeEvent,
    ScrollSnapEvent, StrategyFallbackEvent, TraceSink,
};

/// A sink that forwards every event to two sinks, `A` first.
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_pass_commit(&mut self, e: &PassCommitEvent) {
        self.0.on_pass_commit(e);
        self.1.on_pass_commit(e);
    }

    fn on_transition_begin(&mut self, e: &EdgeEvent<'_>) {
        self.0.on_transition_begin(e);
        self.1.on_transition_begin(e);
    }

    fn on_transition_end(&mut self, e: &EdgeEvent<'_>) {
        self.0.on_transition_end(e);
        self.1.on_transition_end(e);
    }

    fn on_phase_change(&mut self, e: &PhaseChangeEvent<'_>) {
        self.0.on_phase_change(e);
        self.1.on_phase_change(e);
    }

    fn on_completion(&mut self, e: &CompletionEvent<'_>) {
        self.0.on_completion(e);
        self.1.on_completion(e);
    }

    fn on_scroll_snap(&mut self, e: &ScrollSnapEvent) {
        self.0.on_scroll_snap(e);
        self.1.on_scroll_snap(e);
    }

    fn on_strategy_fallback(&mut self, e: &StrategyFallbackEvent<'_>) {
        self.0.on_strategy_fallback(e);
        self.1.on_strategy_fallback(e);
    }

    fn on_frame_geometry(&mut self, e: &FrameGeometryEvent<'_>) {
        self.0.on_frame_geometry(e);
        self.1.on_frame_geometry(e);
    }
}
