// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop driving card flights and a scroll-driven header.
//!
//! Runs 140 synthetic frames over a tiny scene: a three-photo grid, a detail
//! view that shows the selected photo, and a large title that collapses into
//! the navigation bar as the list scrolls. Along the way it
//!
//! - flies a photo into the detail view and back (trigger-driven),
//! - flies the whole grid as a staggered group,
//! - drags the header halfway and lets it snap (scroll-driven),
//!
//! printing trace lines to stdout through a
//! [`PrettyPrintSink`](ferry_debug::pretty::PrettyPrintSink) and exporting a
//! Chrome trace from a [`RecorderSink`](ferry_debug::recorder::RecorderSink).
//! Mirroring is requested for the photos but the demo backend has none, so
//! they fall back to duplicate surfaces.

use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::Rect;

use ferry_core::anchor::{Role, Slot, TransitionKey};
use ferry_core::animation::AnimationSpec;
use ferry_core::progress::{Edge, ItemTrigger, ScrollConfig, ScrollController, ScrollPhase};
use ferry_core::registry::{AnchorPublisher, AnchorRegistry};
use ferry_core::time::{Duration, HostTime};
use ferry_core::trace::{PassCommitEvent, ScrollSnapEvent, Tracer};
use ferry_core::transition::{Completion, CornerSpec, GroupId, TransitionOptions, TransitionStore};
use ferry_debug::Tee;
use ferry_debug::pretty::PrettyPrintSink;
use ferry_debug::recorder::RecorderSink;
use ferry_render::{
    ContentRequest, NoMirroring, PlanBuilder, Presenter, SourceHandle, SurfaceId, TransitionPlan,
};

const FRAME_COUNT: u64 = 140;
/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;
const PHOTOS: u32 = 3;
const GRID: GroupId = GroupId(1);

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

fn photo_key(i: u32) -> TransitionKey {
    TransitionKey::new(format!("photo-{i}"))
}

/// Thumbnails laid out in a row.
struct Grid;

impl AnchorPublisher for Grid {
    fn publish_anchors(&self, registry: &mut AnchorRegistry) {
        for i in 0..PHOTOS {
            let x = 16.0 + 112.0 * i as f64;
            let bounds = Rect::new(x, 200.0, x + 96.0, 296.0);
            registry.publish(photo_key(i), Role::Source, Slot::Content, bounds);
        }
    }
}

/// Full-width detail view; shows either one photo or the whole grid stacked.
struct Detail {
    shown: Vec<u32>,
}

impl AnchorPublisher for Detail {
    fn publish_anchors(&self, registry: &mut AnchorRegistry) {
        for (row, &i) in self.shown.iter().enumerate() {
            let y = 120.0 + 360.0 * row as f64;
            let bounds = Rect::new(0.0, y, 390.0, y + 340.0);
            registry.publish(photo_key(i), Role::Destination, Slot::Content, bounds);
        }
    }
}

/// Large title in the list and its compact twin in the navigation bar.
struct Header;

impl AnchorPublisher for Header {
    fn publish_anchors(&self, registry: &mut AnchorRegistry) {
        let large = Rect::new(16.0, 96.0, 216.0, 136.0);
        let compact = Rect::new(145.0, 52.0, 245.0, 72.0);
        registry.publish("header", Role::Source, Slot::Title, large);
        registry.publish("header", Role::Destination, Slot::Title, compact);
    }
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// Counts what a real overlay would have drawn.
#[derive(Debug, Default)]
struct CountingPresenter {
    frames_with_flights: u64,
    floating_items: u64,
    damaged_frames: u64,
}

impl Presenter for CountingPresenter {
    fn apply(&mut self, plan: &TransitionPlan) {
        if !plan.floating.is_empty() {
            self.frames_with_flights += 1;
        }
        self.floating_items += plan.floating.len() as u64;
        if !plan.damage.is_empty() {
            self.damaged_frames += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Selected photo per frame.
fn selection(frame: u64) -> Option<u32> {
    (5..30).contains(&frame).then_some(1)
}

/// Scroll phase and offset per frame, `None` when nothing happens.
fn scroll(frame: u64) -> (Option<ScrollPhase>, Option<f64>) {
    match frame {
        10 => (Some(ScrollPhase::Interacting), Some(0.0)),
        11..=24 => (None, Some(2.0 * (frame - 10) as f64)),
        25 => (Some(ScrollPhase::Idle), None),
        _ => (None, None),
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut sink = Tee(pretty, RecorderSink::new());

    // -- engine ------------------------------------------------------------
    let mut registry = AnchorRegistry::new();
    let mut store = TransitionStore::new();
    let mut builder = PlanBuilder::new();
    let mut presenter = CountingPresenter::default();
    let mut selected = ItemTrigger::<u32>::new();
    let mut header = ScrollController::new(ScrollConfig::navigation_title());
    let group_runs = Rc::new(Cell::new(0_u32));

    for i in 0..PHOTOS {
        builder.set_content(
            photo_key(i),
            ContentRequest::mirror(SourceHandle(u64::from(i)), SurfaceId(i)),
        );
    }
    builder.set_content("header", ContentRequest::duplicate(SurfaceId(100)));

    let flight = TransitionOptions::default()
        .with_animation(AnimationSpec::smooth())
        .with_corner(CornerSpec {
            source_radius: 12.0,
            destination_radius: 0.0,
        });
    let title = TransitionOptions::default().in_slot(Slot::Title);

    // -- simulated loop ----------------------------------------------------
    let mut now_ticks: u64 = 1_000_000_000; // start at 1s
    let mut tracer = Tracer::new(&mut sink);

    for frame in 0..FRAME_COUNT {
        let now = HostTime(now_ticks);

        // 1. Layout: the detail view shows the selection, or the whole grid
        //    while the group flight is up.
        let mut detail = Detail { shown: Vec::new() };
        if let Some(i) = selection(frame) {
            detail.shown.push(i);
        }
        if (60..95).contains(&frame) {
            detail.shown.extend(0..PHOTOS);
        }
        let summary = registry.collect(&[&Grid, &detail, &Header]);
        tracer.pass_commit(&PassCommitEvent::new(now, &summary));
        store.mark_geometry(&summary);

        // 2. Triggers.
        match selected.update(selection(frame)) {
            Some(Edge::Activate(i)) => {
                let done: Completion = Box::new(move |finished: bool| {
                    println!("photo-{i} flight finished={finished}");
                });
                store.begin(&mut registry, photo_key(i), flight, Some(done), now);
            }
            Some(Edge::Deactivate(i)) => store.end(&photo_key(i), now),
            Some(Edge::Switch { from, to }) => {
                store.end(&photo_key(from), now);
                store.begin(&mut registry, photo_key(to), flight, None, now);
            }
            None => {}
        }
        if frame == 60 {
            let runs = Rc::clone(&group_runs);
            let done: Completion = Box::new(move |_| runs.set(runs.get() + 1));
            let staggered = flight.with_stagger(Duration::from_millis(40));
            let keys = (0..PHOTOS).map(photo_key);
            store.begin_group(&mut registry, GRID, keys, staggered, Some(done), now);
        }
        if frame == 95 {
            store.end_group(GRID, now);
        }

        // 3. Scroll.
        let (phase, offset) = scroll(frame);
        if let Some(phase) = phase
            && let Some(snap) = header.on_scroll_phase_change(phase, now)
        {
            tracer.scroll_snap(&ScrollSnapEvent::from(&snap));
        }
        if let Some(offset) = offset {
            let _ = header.on_scroll_offset_change(offset);
        }
        let progress = header.tick(now);
        store.drive(&mut registry, "header", progress, title);

        // 4. Evaluate.
        let changes = store.evaluate(now, &mut registry);
        changes.emit(now, &mut tracer);

        // 5. Present.
        let plan = builder.build(now, &store, registry.snapshot(), &NoMirroring, &mut tracer);
        presenter.apply(&plan);

        now_ticks += REFRESH_INTERVAL_NS;
    }
    drop(tracer);

    println!(
        "{} frames with flights, {} floating items, {} damaged frames, {} group completions",
        presenter.frames_with_flights,
        presenter.floating_items,
        presenter.damaged_frames,
        group_runs.get(),
    );

    // -- export Chrome trace -----------------------------------------------
    let Tee(_, recorder) = sink;
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    ferry_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
