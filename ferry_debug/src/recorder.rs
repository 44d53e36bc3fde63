// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Keys are stored as a `u32` byte length
//! followed by UTF-8 bytes. [`decode`] reads them back as an iterator of
//! owned [`RecordedEvent`]s.

use ferry_core::time::HostTime;
use ferry_core::trace::{
    CompletionEvent, Direction, EdgeEvent, FallbackReason, FrameGeometryEvent, PassCommitEvent,
    PhaseChangeEvent, ScrollSnapEvent, StrategyFallbackEvent, TraceSink,
};
use ferry_core::transition::{GroupId, Phase, TransitionId};
use kurbo::Rect;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_COMMIT: u8 = 1;
const TAG_TRANSITION_BEGIN: u8 = 2;
const TAG_TRANSITION_END: u8 = 3;
const TAG_PHASE_CHANGE: u8 = 4;
const TAG_COMPLETION: u8 = 5;
const TAG_SCROLL_SNAP: u8 = 6;
const TAG_STRATEGY_FALLBACK: u8 = 7;
const TAG_FRAME_GEOMETRY: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "keys longer than u32::MAX bytes are truncated for recording"
        )]
        let len = s.len().min(u32::MAX as usize) as u32;
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_group(&mut self, group: Option<GroupId>) {
        match group {
            Some(g) => {
                self.write_u8(1);
                self.write_u32(g.0);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_id(&mut self, id: TransitionId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_edge(&mut self, tag: u8, e: &EdgeEvent<'_>) {
        self.write_u8(tag);
        self.write_u64(e.time.nanos());
        self.write_id(e.id);
        self.write_str(e.key);
        self.write_group(e.group);
        self.write_f64(e.from_progress);
        self.write_bool(e.redirected);
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_commit(&mut self, e: &PassCommitEvent) {
        self.write_u8(TAG_PASS_COMMIT);
        self.write_u64(e.time.nanos());
        self.write_u64(e.revision);
        self.write_u32(e.published);
        self.write_u32(e.carried);
        self.write_u32(e.changed);
    }

    fn on_transition_begin(&mut self, e: &EdgeEvent<'_>) {
        self.write_edge(TAG_TRANSITION_BEGIN, e);
    }

    fn on_transition_end(&mut self, e: &EdgeEvent<'_>) {
        self.write_edge(TAG_TRANSITION_END, e);
    }

    fn on_phase_change(&mut self, e: &PhaseChangeEvent<'_>) {
        self.write_u8(TAG_PHASE_CHANGE);
        self.write_u64(e.time.nanos());
        self.write_id(e.id);
        self.write_str(e.key);
        self.write_u8(e.from.as_u8());
        self.write_u8(e.to.as_u8());
    }

    fn on_completion(&mut self, e: &CompletionEvent<'_>) {
        self.write_u8(TAG_COMPLETION);
        self.write_u64(e.time.nanos());
        self.write_str(e.key);
        self.write_group(e.group);
        self.write_bool(e.finished);
    }

    fn on_scroll_snap(&mut self, e: &ScrollSnapEvent) {
        self.write_u8(TAG_SCROLL_SNAP);
        self.write_u64(e.time.nanos());
        self.write_f64(e.from_progress);
        self.write_f64(e.target);
    }

    fn on_strategy_fallback(&mut self, e: &StrategyFallbackEvent<'_>) {
        self.write_u8(TAG_STRATEGY_FALLBACK);
        self.write_str(e.key);
        self.write_u8(match e.reason {
            FallbackReason::MirroringUnavailable => 0,
        });
    }

    fn on_frame_geometry(&mut self, e: &FrameGeometryEvent<'_>) {
        self.write_u8(TAG_FRAME_GEOMETRY);
        self.write_u64(e.time.nanos());
        self.write_str(e.key);
        self.write_f64(e.progress);
        self.write_f64(e.rect.x0);
        self.write_f64(e.rect.y0);
        self.write_f64(e.rect.x1);
        self.write_f64(e.rect.y1);
        self.write_f64(e.opacity);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A recorded edge (begin or end).
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedEdge {
    /// Host time of the edge.
    pub time: HostTime,
    /// Slot index of the record.
    pub index: u32,
    /// Generation of the record.
    pub generation: u32,
    /// Record key.
    pub key: String,
    /// Group, if any.
    pub group: Option<GroupId>,
    /// Direction of the new run.
    pub direction: Direction,
    /// Progress at which the run starts.
    pub from_progress: f64,
    /// Whether an in-flight run was redirected.
    pub redirected: bool,
}

/// A recorded phase change.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedPhaseChange {
    /// Host time of the evaluation.
    pub time: HostTime,
    /// Slot index of the record.
    pub index: u32,
    /// Generation of the record.
    pub generation: u32,
    /// Record key.
    pub key: String,
    /// Previous phase.
    pub from: Phase,
    /// New phase.
    pub to: Phase,
}

/// A recorded completion.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCompletion {
    /// Host time of the evaluation.
    pub time: HostTime,
    /// Key whose callback fired.
    pub key: String,
    /// Group, if any.
    pub group: Option<GroupId>,
    /// Forward (`true`) or reverse (`false`) completion.
    pub finished: bool,
}

/// A recorded floating geometry sample.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedGeometry {
    /// Host time of the frame.
    pub time: HostTime,
    /// Record key.
    pub key: String,
    /// Progress.
    pub progress: f64,
    /// On-screen rectangle.
    pub rect: Rect,
    /// Opacity.
    pub opacity: f64,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassCommitEvent`].
    PassCommit(PassCommitEvent),
    /// A begin or end edge.
    Edge(RecordedEdge),
    /// A phase change.
    PhaseChange(RecordedPhaseChange),
    /// A completion.
    Completion(RecordedCompletion),
    /// A [`ScrollSnapEvent`].
    ScrollSnap(ScrollSnapEvent),
    /// A strategy fallback.
    StrategyFallback {
        /// Key of the transition.
        key: String,
        /// Why it fell back.
        reason: FallbackReason,
    },
    /// A floating geometry sample.
    FrameGeometry(RecordedGeometry),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Option<&[u8]> {
        if self.remaining() < n {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_group(&mut self) -> Option<Option<GroupId>> {
        let present = self.read_u8()?;
        let group = self.read_u32()?;
        Some((present != 0).then_some(GroupId(group)))
    }

    fn read_phase(&mut self) -> Option<Phase> {
        Phase::from_u8(self.read_u8()?)
    }

    fn decode_pass_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassCommit(PassCommitEvent {
            time: self.read_time()?,
            revision: self.read_u64()?,
            published: self.read_u32()?,
            carried: self.read_u32()?,
            changed: self.read_u32()?,
        }))
    }

    fn decode_edge(&mut self, direction: Direction) -> Option<RecordedEvent> {
        Some(RecordedEvent::Edge(RecordedEdge {
            time: self.read_time()?,
            index: self.read_u32()?,
            generation: self.read_u32()?,
            key: self.read_string()?,
            group: self.read_group()?,
            direction,
            from_progress: self.read_f64()?,
            redirected: self.read_bool()?,
        }))
    }

    fn decode_phase_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseChange(RecordedPhaseChange {
            time: self.read_time()?,
            index: self.read_u32()?,
            generation: self.read_u32()?,
            key: self.read_string()?,
            from: self.read_phase()?,
            to: self.read_phase()?,
        }))
    }

    fn decode_completion(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Completion(RecordedCompletion {
            time: self.read_time()?,
            key: self.read_string()?,
            group: self.read_group()?,
            finished: self.read_bool()?,
        }))
    }

    fn decode_scroll_snap(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScrollSnap(ScrollSnapEvent {
            time: self.read_time()?,
            from_progress: self.read_f64()?,
            target: self.read_f64()?,
        }))
    }

    fn decode_strategy_fallback(&mut self) -> Option<RecordedEvent> {
        let key = self.read_string()?;
        let reason = match self.read_u8()? {
            0 => FallbackReason::MirroringUnavailable,
            _ => return None,
        };
        Some(RecordedEvent::StrategyFallback { key, reason })
    }

    fn decode_frame_geometry(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameGeometry(RecordedGeometry {
            time: self.read_time()?,
            key: self.read_string()?,
            progress: self.read_f64()?,
            rect: Rect::new(
                self.read_f64()?,
                self.read_f64()?,
                self.read_f64()?,
                self.read_f64()?,
            ),
            opacity: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_COMMIT => self.decode_pass_commit(),
            TAG_TRANSITION_BEGIN => self.decode_edge(Direction::Forward),
            TAG_TRANSITION_END => self.decode_edge(Direction::Reverse),
            TAG_PHASE_CHANGE => self.decode_phase_change(),
            TAG_COMPLETION => self.decode_completion(),
            TAG_SCROLL_SNAP => self.decode_scroll_snap(),
            TAG_STRATEGY_FALLBACK => self.decode_strategy_fallback(),
            TAG_FRAME_GEOMETRY => self.decode_frame_geometry(),
            _ => None, // unknown tag, stop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::registry::AnchorRegistry;
    use ferry_core::transition::{TransitionOptions, TransitionStore};

    fn some_id(key: &str) -> TransitionId {
        let mut registry = AnchorRegistry::new();
        TransitionStore::new().drive(&mut registry, key, 0.0, TransitionOptions::default())
    }

    #[test]
    fn edge_keeps_key_group_and_direction() {
        let id = some_id("card-1");
        let mut rec = RecorderSink::new();
        rec.on_transition_end(&EdgeEvent {
            time: HostTime(5_000),
            id,
            key: "card-1",
            group: Some(GroupId(2)),
            direction: Direction::Reverse,
            from_progress: 0.4,
            redirected: true,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Edge(e) => {
                assert_eq!(e.time, HostTime(5_000));
                assert_eq!(e.index, id.index());
                assert_eq!(e.generation, id.generation());
                assert_eq!(e.key, "card-1");
                assert_eq!(e.group, Some(GroupId(2)));
                assert_eq!(e.direction, Direction::Reverse);
                assert_eq!(e.from_progress, 0.4);
                assert!(e.redirected, "redirect flag lost");
            }
            other => panic!("expected Edge, got {other:?}"),
        }
    }

    #[test]
    fn mixed_stream_decodes_in_order() {
        let id = some_id("hero");
        let mut rec = RecorderSink::new();
        rec.on_pass_commit(&PassCommitEvent {
            time: HostTime(0),
            revision: 1,
            published: 4,
            carried: 0,
            changed: 2,
        });
        rec.on_phase_change(&PhaseChangeEvent {
            time: HostTime(10),
            id,
            key: "hero",
            from: Phase::Animating,
            to: Phase::Settled,
        });
        rec.on_completion(&CompletionEvent {
            time: HostTime(10),
            key: "hero",
            group: None,
            finished: true,
        });
        rec.on_scroll_snap(&ScrollSnapEvent {
            time: HostTime(20),
            from_progress: 0.7,
            target: 1.0,
        });
        rec.on_strategy_fallback(&StrategyFallbackEvent {
            key: "hero",
            reason: FallbackReason::MirroringUnavailable,
        });
        rec.on_frame_geometry(&FrameGeometryEvent {
            time: HostTime(30),
            key: "hero",
            progress: 0.5,
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            opacity: 0.5,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            events[0],
            RecordedEvent::PassCommit(PassCommitEvent { revision: 1, .. })
        ));
        match &events[1] {
            RecordedEvent::PhaseChange(p) => {
                assert_eq!((p.from, p.to), (Phase::Animating, Phase::Settled));
            }
            other => panic!("expected PhaseChange, got {other:?}"),
        }
        assert!(matches!(
            &events[2],
            RecordedEvent::Completion(c) if c.finished && c.group.is_none()
        ));
        assert!(matches!(&events[3], RecordedEvent::ScrollSnap(s) if s.target == 1.0));
        assert!(matches!(
            &events[4],
            RecordedEvent::StrategyFallback { key, .. } if key == "hero"
        ));
        match &events[5] {
            RecordedEvent::FrameGeometry(g) => {
                assert_eq!(g.rect, Rect::new(1.0, 2.0, 3.0, 4.0));
                assert_eq!(g.opacity, 0.5);
            }
            other => panic!("expected FrameGeometry, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty(), "decoded events from nothing");
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_completion(&CompletionEvent {
            time: HostTime(1),
            key: "a",
            group: None,
            finished: false,
        });
        rec.on_completion(&CompletionEvent {
            time: HostTime(2),
            key: "b",
            group: None,
            finished: false,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }
}
