// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use ferry_core::time::HostTime;
use ferry_core::trace::{
    CompletionEvent, Direction, EdgeEvent, FrameGeometryEvent, PassCommitEvent, PhaseChangeEvent,
    ScrollSnapEvent, StrategyFallbackEvent, TraceSink,
};
use ferry_core::transition::GroupId;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    geometry: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-frame geometry lines are off by default; see
    /// [`with_geometry`](Self::with_geometry).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            geometry: false,
        }
    }

    /// Enables or disables the per-frame `[geom]` lines.
    #[must_use]
    pub fn with_geometry(mut self, geometry: bool) -> Self {
        self.geometry = geometry;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.nanos() as f64 / 1_000_000.0
}

fn group_label(group: Option<GroupId>) -> String {
    group.map_or_else(|| "-".to_owned(), |g| g.0.to_string())
}

impl<W: Write> PrettyPrintSink<W> {
    fn edge(&mut self, e: &EdgeEvent<'_>) {
        let arrow = match e.direction {
            Direction::Forward => "begin",
            Direction::Reverse => "end",
        };
        let how = if e.redirected { " redirected" } else { "" };
        let _ = writeln!(
            self.writer,
            "[{arrow}] {:.1}ms key={} group={} from={:.3}{how}",
            ms(e.time),
            e.key,
            group_label(e.group),
            e.from_progress,
        );
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_commit(&mut self, e: &PassCommitEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] {:.1}ms rev={} published={} carried={} changed={}",
            ms(e.time),
            e.revision,
            e.published,
            e.carried,
            e.changed,
        );
    }

    fn on_transition_begin(&mut self, e: &EdgeEvent<'_>) {
        self.edge(e);
    }

    fn on_transition_end(&mut self, e: &EdgeEvent<'_>) {
        self.edge(e);
    }

    fn on_phase_change(&mut self, e: &PhaseChangeEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[phase] {:.1}ms key={} {} -> {}",
            ms(e.time),
            e.key,
            e.from.name(),
            e.to.name(),
        );
    }

    fn on_completion(&mut self, e: &CompletionEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[done] {:.1}ms key={} group={} finished={}",
            ms(e.time),
            e.key,
            group_label(e.group),
            e.finished,
        );
    }

    fn on_scroll_snap(&mut self, e: &ScrollSnapEvent) {
        let _ = writeln!(
            self.writer,
            "[snap] {:.1}ms {:.3} -> {}",
            ms(e.time),
            e.from_progress,
            e.target,
        );
    }

    fn on_strategy_fallback(&mut self, e: &StrategyFallbackEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[fallback] key={} reason={:?}",
            e.key, e.reason,
        );
    }

    fn on_frame_geometry(&mut self, e: &FrameGeometryEvent<'_>) {
        if !self.geometry {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[geom] {:.1}ms key={} t={:.3} rect=({:.1}, {:.1}, {:.1}, {:.1}) opacity={:.2}",
            ms(e.time),
            e.key,
            e.progress,
            e.rect.x0,
            e.rect.y0,
            e.rect.x1,
            e.rect.y1,
            e.opacity,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::registry::AnchorRegistry;
    use ferry_core::trace::FallbackReason;
    use ferry_core::transition::{Phase, TransitionOptions, TransitionStore};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_edge() {
        let mut registry = AnchorRegistry::new();
        let options = TransitionOptions::default();
        let id = TransitionStore::new().drive(&mut registry, "card-1", 0.0, options);
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transition_begin(&EdgeEvent {
            time: HostTime(16_000_000),
            id,
            key: "card-1",
            group: Some(GroupId(3)),
            direction: Direction::Forward,
            from_progress: 0.25,
            redirected: true,
        });
        let out = output(sink);
        assert!(out.starts_with("[begin] 16.0ms"), "got: {out}");
        assert!(out.contains("key=card-1 group=3 from=0.250 redirected"), "got: {out}");
    }

    #[test]
    fn pretty_print_phase_and_fallback() {
        let mut registry = AnchorRegistry::new();
        let id =
            TransitionStore::new().drive(&mut registry, "hero", 0.0, TransitionOptions::default());
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_change(&PhaseChangeEvent {
            time: HostTime(0),
            id,
            key: "hero",
            from: Phase::Activating,
            to: Phase::Animating,
        });
        sink.on_strategy_fallback(&StrategyFallbackEvent {
            key: "hero",
            reason: FallbackReason::MirroringUnavailable,
        });
        let out = output(sink);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("activating -> animating"), "got: {out}");
        assert!(lines[1].contains("MirroringUnavailable"), "got: {out}");
    }

    #[test]
    fn geometry_lines_are_opt_in() {
        let event = FrameGeometryEvent {
            time: HostTime(0),
            key: "hero",
            progress: 0.5,
            rect: kurbo::Rect::new(0.0, 0.0, 10.0, 10.0),
            opacity: 1.0,
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_frame_geometry(&event);
        assert!(output(quiet).is_empty(), "geometry lines printed while disabled");

        let mut loud = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_geometry(true);
        loud.on_frame_geometry(&event);
        assert!(output(loud).starts_with("[geom]"), "missing geometry line");
    }
}
