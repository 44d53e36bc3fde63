// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progress sources: edge detectors and the scroll-driven controller.
//!
//! Trigger-driven transitions only need to know *when* the caller's state
//! flips. [`Trigger`] and [`ItemTrigger`] turn level state into [`Edge`]s
//! that the host maps onto
//! [`TransitionStore::begin`](crate::transition::TransitionStore::begin) and
//! [`end`](crate::transition::TransitionStore::end).
//!
//! Scroll-driven transitions derive progress from a live offset.
//! [`ScrollController`] follows the gesture, suspends while no gesture is
//! active and snaps to 0 or 1 when the gesture ends; the host writes its
//! [`progress`](ScrollController::progress) into a record with
//! [`drive`](crate::transition::TransitionStore::drive).

use crate::animation::{AnimationSpec, Run};
use crate::geometry::{clamp01, progress};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Edge detectors
// ---------------------------------------------------------------------------

/// A change in the caller's activation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge<T = ()> {
    /// Became active with this item.
    Activate(T),
    /// Stopped being active; carries the previous item.
    Deactivate(T),
    /// Active item changed without passing through inactive.
    Switch {
        /// Previously active item.
        from: T,
        /// Newly active item.
        to: T,
    },
}

/// Edge detector over a boolean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trigger {
    active: bool,
}

impl Trigger {
    /// Creates a detector with the given initial state (no edge reported for
    /// it).
    #[must_use]
    pub const fn new(active: bool) -> Self {
        Self { active }
    }

    /// Current state.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Records the new state and returns the edge it implies, if any.
    pub fn update(&mut self, active: bool) -> Option<Edge> {
        let was = core::mem::replace(&mut self.active, active);
        match (was, active) {
            (false, true) => Some(Edge::Activate(())),
            (true, false) => Some(Edge::Deactivate(())),
            _ => None,
        }
    }
}

/// Edge detector over an optional item (e.g. the selected grid cell).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemTrigger<T> {
    current: Option<T>,
}

impl<T> Default for ItemTrigger<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T: Clone + PartialEq> ItemTrigger<T> {
    /// Creates a detector with no active item.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Currently active item.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Records the new item and returns the edge it implies, if any.
    pub fn update(&mut self, item: Option<T>) -> Option<Edge<T>> {
        if self.current == item {
            return None;
        }
        let previous = core::mem::replace(&mut self.current, item.clone());
        match (previous, item) {
            (None, Some(to)) => Some(Edge::Activate(to)),
            (Some(from), None) => Some(Edge::Deactivate(from)),
            (Some(from), Some(to)) => Some(Edge::Switch { from, to }),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scroll controller
// ---------------------------------------------------------------------------

/// Phase of the host's scroll container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollPhase {
    /// Not scrolling.
    #[default]
    Idle,
    /// Finger down, not yet dragging.
    Tracking,
    /// Dragging.
    Interacting,
    /// Coasting after the finger lifted.
    Decelerating,
    /// Programmatic scroll animation.
    Animating,
}

impl ScrollPhase {
    /// Whether the phase belongs to a user gesture.
    #[must_use]
    pub const fn is_gesture(self) -> bool {
        matches!(self, Self::Tracking | Self::Interacting | Self::Decelerating)
    }
}

/// Where the transition range begins along the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StartOffset {
    /// A fixed offset.
    Fixed(f64),
    /// `base + factor * accessory_height`, for headers whose accessory
    /// height is only known after layout.
    Accessory {
        /// Offset with no accessory.
        base: f64,
        /// Multiplier on the measured accessory height.
        factor: f64,
    },
}

impl StartOffset {
    /// Resolves the offset for a measured accessory height.
    #[must_use]
    pub fn resolve(self, accessory_height: f64) -> f64 {
        match self {
            Self::Fixed(offset) => offset,
            Self::Accessory { base, factor } => base + factor * accessory_height,
        }
    }
}

/// Tuning of a [`ScrollController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Where the transition begins.
    pub start: StartOffset,
    /// Scroll distance over which progress goes from 0 to 1.
    pub range: f64,
    /// Progress at or above which a released gesture snaps to 1.
    pub snap_threshold: f64,
    /// Animation of the snap.
    pub snap: AnimationSpec,
}

impl ScrollConfig {
    /// Inline title morphing into a navigation bar title.
    #[must_use]
    pub const fn navigation_title() -> Self {
        Self {
            start: StartOffset::Fixed(0.0),
            range: 44.0,
            snap_threshold: 0.5,
            snap: AnimationSpec::snap_back(),
        }
    }

    /// Large header with an accessory row; the morph starts once the
    /// accessory has scrolled away.
    #[must_use]
    pub const fn large_header() -> Self {
        Self {
            start: StartOffset::Accessory {
                base: -20.0,
                factor: 1.0,
            },
            range: 40.0,
            snap_threshold: 0.5,
            snap: AnimationSpec::snap_back(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::navigation_title()
    }
}

/// A snap started at the end of a gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snap {
    /// When the snap started.
    pub started_at: HostTime,
    /// Progress when the gesture ended.
    pub from: f64,
    /// Snap target, 0 or 1.
    pub target: f64,
    /// Scroll offset at which progress equals `target`, for settling the
    /// scroll position.
    pub offset: f64,
}

/// Scroll-driven progress with gesture-end snapping.
#[derive(Clone, Debug)]
pub struct ScrollController {
    config: ScrollConfig,
    phase: ScrollPhase,
    offset: f64,
    accessory_height: f64,
    progress: f64,
    snap: Option<Run>,
}

impl ScrollController {
    /// Creates a controller at rest with progress 0.
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            phase: ScrollPhase::Idle,
            offset: 0.0,
            accessory_height: 0.0,
            progress: 0.0,
            snap: None,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Current scroll phase.
    #[must_use]
    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// Current progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Last reported scroll offset.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Whether a snap is in flight.
    #[must_use]
    pub fn is_snapping(&self) -> bool {
        self.snap.is_some()
    }

    /// Resolved start offset for the current accessory height.
    #[must_use]
    pub fn start_offset(&self) -> f64 {
        self.config.start.resolve(self.accessory_height)
    }

    /// Records a measured accessory height.
    pub fn set_accessory_height(&mut self, height: f64) {
        debug_assert!(height.is_finite(), "non-finite accessory height");
        self.accessory_height = height.max(0.0);
    }

    /// Handles a scroll phase change.
    ///
    /// A gesture starting mid-snap cancels the snap at its current value.
    /// A gesture ending with progress strictly between 0 and 1 starts a snap
    /// toward the nearer end (ties go to 1) and returns it.
    pub fn on_scroll_phase_change(&mut self, phase: ScrollPhase, now: HostTime) -> Option<Snap> {
        let was_gesture = self.phase.is_gesture();
        self.phase = phase;
        if phase.is_gesture() {
            if let Some(run) = self.snap.take() {
                self.progress = clamp01(run.sample(now).value);
            }
            return None;
        }
        if !was_gesture || self.progress <= 0.0 || self.progress >= 1.0 {
            return None;
        }
        let target = if self.progress >= self.config.snap_threshold {
            1.0
        } else {
            0.0
        };
        self.snap = Some(Run::immediate(self.progress, target, now, self.config.snap));
        Some(Snap {
            started_at: now,
            from: self.progress,
            target,
            offset: self.start_offset() + target * self.config.range,
        })
    }

    /// Handles a scroll offset change.
    ///
    /// Returns the new progress while a gesture is active, `None` while
    /// recomputation is suspended.
    pub fn on_scroll_offset_change(&mut self, offset: f64) -> Option<f64> {
        self.offset = offset;
        if !self.phase.is_gesture() {
            return None;
        }
        self.progress = progress(offset, self.start_offset(), self.config.range);
        Some(self.progress)
    }

    /// Advances a snap in flight to `now` and returns the current progress.
    pub fn tick(&mut self, now: HostTime) -> f64 {
        if let Some(run) = self.snap {
            let sample = run.sample(now);
            self.progress = clamp01(sample.value);
            if sample.finished {
                self.snap = None;
            }
        }
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;

    fn ms(v: u64) -> HostTime {
        HostTime(Duration::from_millis(v).nanos())
    }

    #[test]
    fn trigger_reports_flips_only() {
        let mut trigger = Trigger::default();
        assert_eq!(trigger.update(false), None);
        assert_eq!(trigger.update(true), Some(Edge::Activate(())));
        assert_eq!(trigger.update(true), None);
        assert_eq!(trigger.update(false), Some(Edge::Deactivate(())));
    }

    #[test]
    fn item_trigger_reports_switches() {
        let mut trigger = ItemTrigger::new();
        assert_eq!(trigger.update(Some(3_u32)), Some(Edge::Activate(3)));
        assert_eq!(trigger.update(Some(3)), None);
        assert_eq!(trigger.update(Some(5)), Some(Edge::Switch { from: 3, to: 5 }));
        assert_eq!(trigger.current(), Some(&5));
        assert_eq!(trigger.update(None), Some(Edge::Deactivate(5)));
        assert_eq!(trigger.update(None), None);
    }

    #[test]
    fn large_header_scenario() {
        let mut ctl = ScrollController::new(ScrollConfig::large_header());
        ctl.on_scroll_phase_change(ScrollPhase::Interacting, ms(0));
        assert_eq!(ctl.on_scroll_offset_change(0.0), Some(0.5));
        assert_eq!(ctl.on_scroll_offset_change(-30.0), Some(0.0));

        ctl.set_accessory_height(30.0);
        assert_eq!(ctl.start_offset(), 10.0);
        assert_eq!(ctl.on_scroll_offset_change(30.0), Some(0.5));
    }

    #[test]
    fn offsets_outside_a_gesture_are_ignored() {
        let mut ctl = ScrollController::new(ScrollConfig::navigation_title());
        assert_eq!(ctl.on_scroll_offset_change(30.0), None);
        assert_eq!(ctl.progress(), 0.0);
        ctl.on_scroll_phase_change(ScrollPhase::Animating, ms(0));
        assert_eq!(ctl.on_scroll_offset_change(30.0), None);
        assert_eq!(ctl.offset(), 30.0);
    }

    #[test]
    fn gesture_end_snaps_to_nearer_end() {
        let mut ctl = ScrollController::new(ScrollConfig::navigation_title());
        ctl.on_scroll_phase_change(ScrollPhase::Interacting, ms(0));
        ctl.on_scroll_offset_change(11.0);
        assert_eq!(ctl.progress(), 0.25);
        let snap = ctl
            .on_scroll_phase_change(ScrollPhase::Idle, ms(100))
            .unwrap();
        assert_eq!(snap.target, 0.0);
        assert_eq!(snap.offset, 0.0);
        assert!(ctl.is_snapping());
        assert_eq!(ctl.tick(ms(400)), 0.0);
        assert!(!ctl.is_snapping());
    }

    #[test]
    fn threshold_tie_goes_to_one() {
        let mut ctl = ScrollController::new(ScrollConfig::navigation_title());
        ctl.on_scroll_phase_change(ScrollPhase::Decelerating, ms(0));
        ctl.on_scroll_offset_change(22.0);
        let snap = ctl
            .on_scroll_phase_change(ScrollPhase::Idle, ms(10))
            .unwrap();
        assert_eq!(snap.target, 1.0);
        assert_eq!(snap.offset, 44.0);
    }

    #[test]
    fn no_snap_at_rest_positions() {
        let mut ctl = ScrollController::new(ScrollConfig::navigation_title());
        ctl.on_scroll_phase_change(ScrollPhase::Interacting, ms(0));
        ctl.on_scroll_offset_change(100.0);
        assert_eq!(ctl.on_scroll_phase_change(ScrollPhase::Idle, ms(10)), None);
        assert_eq!(ctl.progress(), 1.0);
    }

    #[test]
    fn new_gesture_cancels_snap_at_current_value() {
        let mut ctl = ScrollController::new(ScrollConfig::navigation_title());
        ctl.on_scroll_phase_change(ScrollPhase::Interacting, ms(0));
        ctl.on_scroll_offset_change(33.0);
        ctl.on_scroll_phase_change(ScrollPhase::Idle, ms(0));
        let mid = ctl.tick(ms(50));
        assert!(mid > 0.75 && mid < 1.0);
        ctl.on_scroll_phase_change(ScrollPhase::Tracking, ms(50));
        assert!(!ctl.is_snapping());
        assert_eq!(ctl.progress(), mid);
        assert_eq!(ctl.tick(ms(500)), mid);
    }
}
