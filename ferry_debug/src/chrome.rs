// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become async spans keyed by transition key, so each record shows up
//! as its own track with `activating`, `animating`, `settled` and
//! `deactivating` slices. Floating geometry becomes counter tracks.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use ferry_core::time::HostTime;
use ferry_core::trace::Direction;
use ferry_core::transition::Phase;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are nanoseconds and are written as microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Fallback events carry no time; place them at the latest time seen.
    let mut last_us = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PassCommit(e) => {
                last_us = us(e.time);
                events.push(json!({
                    "ph": "i",
                    "name": "PassCommit",
                    "cat": "Anchors",
                    "ts": last_us,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "revision": e.revision,
                        "published": e.published,
                        "carried": e.carried,
                        "changed": e.changed,
                    }
                }));
            }
            RecordedEvent::Edge(e) => {
                last_us = us(e.time);
                let name = match e.direction {
                    Direction::Forward => "Begin",
                    Direction::Reverse => "End",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Edge",
                    "ts": last_us,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "key": e.key,
                        "slot": e.index,
                        "generation": e.generation,
                        "group": e.group.map(|g| g.0),
                        "from_progress": e.from_progress,
                        "redirected": e.redirected,
                    }
                }));
            }
            RecordedEvent::PhaseChange(e) => {
                last_us = us(e.time);
                if e.from != Phase::Idle {
                    events.push(phase_span("e", e.from, &e.key, last_us));
                }
                if e.to != Phase::Idle {
                    events.push(phase_span("b", e.to, &e.key, last_us));
                }
            }
            RecordedEvent::Completion(e) => {
                last_us = us(e.time);
                events.push(json!({
                    "ph": "i",
                    "name": "Completion",
                    "cat": "Edge",
                    "ts": last_us,
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "key": e.key,
                        "group": e.group.map(|g| g.0),
                        "finished": e.finished,
                    }
                }));
            }
            RecordedEvent::ScrollSnap(e) => {
                last_us = us(e.time);
                events.push(json!({
                    "ph": "i",
                    "name": "ScrollSnap",
                    "cat": "Scroll",
                    "ts": last_us,
                    "pid": 0,
                    "tid": 2,
                    "s": "t",
                    "args": {
                        "from_progress": e.from_progress,
                        "target": e.target,
                    }
                }));
            }
            RecordedEvent::StrategyFallback { key, reason } => {
                events.push(json!({
                    "ph": "i",
                    "name": "StrategyFallback",
                    "cat": "Render",
                    "ts": last_us,
                    "pid": 0,
                    "tid": 3,
                    "s": "t",
                    "args": {
                        "key": key,
                        "reason": format!("{reason:?}"),
                    }
                }));
            }
            RecordedEvent::FrameGeometry(g) => {
                last_us = us(g.time);
                events.push(json!({
                    "ph": "C",
                    "name": g.key,
                    "cat": "Geometry",
                    "ts": last_us,
                    "pid": 0,
                    "args": {
                        "progress": g.progress,
                        "opacity": g.opacity,
                        "width": g.rect.width(),
                        "height": g.rect.height(),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn phase_span(ph: &str, phase: Phase, key: &str, ts: f64) -> Value {
    json!({
        "ph": ph,
        "name": phase.name(),
        "cat": "Transition",
        "id": key,
        "ts": ts,
        "pid": 0,
        "tid": 0,
    })
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use ferry_core::registry::AnchorRegistry;
    use ferry_core::trace::{PassCommitEvent, PhaseChangeEvent, TraceSink};
    use ferry_core::transition::{TransitionOptions, TransitionStore};

    #[test]
    fn export_produces_valid_json() {
        let mut registry = AnchorRegistry::new();
        let id = TransitionStore::new().drive(
            &mut registry,
            "card-1",
            0.0,
            TransitionOptions::default(),
        );
        let mut rec = RecorderSink::new();
        rec.on_pass_commit(&PassCommitEvent {
            time: HostTime(1_000_000),
            revision: 1,
            published: 2,
            carried: 0,
            changed: 1,
        });
        rec.on_phase_change(&PhaseChangeEvent {
            time: HostTime(1_000_000),
            id,
            key: "card-1",
            from: Phase::Idle,
            to: Phase::Activating,
        });
        rec.on_phase_change(&PhaseChangeEvent {
            time: HostTime(1_016_000),
            id,
            key: "card-1",
            from: Phase::Activating,
            to: Phase::Animating,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "PassCommit");
        assert_eq!(parsed[0]["ts"], 1000.0);

        // Leaving Idle only opens a span.
        assert_eq!(parsed[1]["ph"], "b");
        assert_eq!(parsed[1]["name"], "activating");
        assert_eq!(parsed[1]["id"], "card-1");

        assert_eq!(parsed[2]["ph"], "e");
        assert_eq!(parsed[2]["name"], "activating");
        assert_eq!(parsed[3]["ph"], "b");
        assert_eq!(parsed[3]["name"], "animating");
        assert_eq!(parsed[3]["ts"], 1016.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty(), "empty recording exported events");
    }
}
