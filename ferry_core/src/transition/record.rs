// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-transition state and the options that configure it.

use alloc::boxed::Box;
use core::fmt;

use crate::anchor::{Slot, TransitionKey};
use crate::animation::{AnimationSpec, Run};
use crate::geometry::{clamp01, lerp};
use crate::time::Duration;

use super::id::GroupId;

/// Lifecycle phase of a transition record.
///
/// Forward: `Idle → Activating → Animating → Settled`.
/// Reverse: `Settled → Deactivating → Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// At rest at progress 0. Records leave the store when they reach this
    /// phase through a reverse run; scroll-driven records rest here.
    #[default]
    Idle,
    /// Activation accepted; the run's delay or stagger has not elapsed.
    Activating,
    /// Running toward 1.
    Animating,
    /// At rest at progress 1.
    Settled,
    /// Running toward 0, or parked at 0 waiting for the rest of its group.
    Deactivating,
}

impl Phase {
    /// Returns the phase name as a static string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Activating => "activating",
            Self::Animating => "animating",
            Self::Settled => "settled",
            Self::Deactivating => "deactivating",
        }
    }

    /// Compact tag used by binary trace encodings.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Activating => 1,
            Self::Animating => 2,
            Self::Settled => 3,
            Self::Deactivating => 4,
        }
    }

    /// Inverse of [`as_u8`](Self::as_u8).
    #[must_use]
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Idle),
            1 => Some(Self::Activating),
            2 => Some(Self::Animating),
            3 => Some(Self::Settled),
            4 => Some(Self::Deactivating),
            _ => None,
        }
    }
}

/// Corner radii at either end of a flight.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerSpec {
    /// Radius of the source element.
    pub source_radius: f64,
    /// Radius of the destination element.
    pub destination_radius: f64,
}

impl CornerSpec {
    /// Same radius at both ends.
    #[must_use]
    pub const fn uniform(radius: f64) -> Self {
        Self {
            source_radius: radius,
            destination_radius: radius,
        }
    }

    /// Radius at progress `t`.
    #[must_use]
    pub fn radius_at(&self, t: f64) -> f64 {
        lerp(self.source_radius, self.destination_radius, clamp01(t)).max(0.0)
    }
}

/// Opacity of the floating copy at progress 0 and 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpacityRamp {
    /// Opacity at progress 0.
    pub from: f64,
    /// Opacity at progress 1.
    pub to: f64,
}

impl Default for OpacityRamp {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl OpacityRamp {
    /// Fully opaque throughout.
    pub const OPAQUE: Self = Self { from: 1.0, to: 1.0 };

    /// Fades in as it travels.
    pub const FADE_IN: Self = Self { from: 0.0, to: 1.0 };

    /// Opacity at progress `t`, clamped to [0, 1].
    #[must_use]
    pub fn at(&self, t: f64) -> f64 {
        clamp01(lerp(self.from, self.to, clamp01(t)))
    }
}

/// How a transition should run, supplied on activation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionOptions {
    /// Group to coordinate with.
    pub group: Option<GroupId>,
    /// Curve, duration and start delay.
    pub animation: AnimationSpec,
    /// Interpolated corner radii.
    pub corner: Option<CornerSpec>,
    /// Hide the source while the floating copy or the destination shows it.
    pub hide_source_when_settled: bool,
    /// Extra start offset per group member position.
    pub stagger: Duration,
    /// Floating copy opacity ramp.
    pub opacity: OpacityRamp,
    /// Peak horizontal arc offset, reached at progress 0.5.
    pub extra_offset_x: f64,
    /// Which anchor slot the floating copy tracks.
    pub slot: Slot,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            group: None,
            animation: AnimationSpec::smooth(),
            corner: None,
            hide_source_when_settled: true,
            stagger: Duration::ZERO,
            opacity: OpacityRamp::OPAQUE,
            extra_offset_x: 0.0,
            slot: Slot::Content,
        }
    }
}

impl TransitionOptions {
    /// Returns a copy that joins `group`.
    #[must_use]
    pub const fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Returns a copy using `animation`.
    #[must_use]
    pub const fn with_animation(mut self, animation: AnimationSpec) -> Self {
        self.animation = animation;
        self
    }

    /// Returns a copy interpolating corner radii.
    #[must_use]
    pub const fn with_corner(mut self, corner: CornerSpec) -> Self {
        self.corner = Some(corner);
        self
    }

    /// Returns a copy with per-member stagger.
    #[must_use]
    pub const fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Returns a copy that does (or does not) hide the source.
    #[must_use]
    pub const fn hide_source(mut self, hide: bool) -> Self {
        self.hide_source_when_settled = hide;
        self
    }

    /// Returns a copy with the given floating opacity ramp.
    #[must_use]
    pub const fn with_opacity(mut self, opacity: OpacityRamp) -> Self {
        self.opacity = opacity;
        self
    }

    /// Returns a copy with a horizontal arc peaking at `offset`.
    #[must_use]
    pub const fn with_extra_offset_x(mut self, offset: f64) -> Self {
        self.extra_offset_x = offset;
        self
    }

    /// Returns a copy tracking `slot` instead of [`Slot::Content`].
    #[must_use]
    pub const fn in_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }
}

/// Callback fired when a run completes: `true` after a forward run, `false`
/// after a reverse run.
pub type Completion = Box<dyn FnMut(bool)>;

/// State of one transition, owned by the store.
pub struct TransitionRecord {
    pub(crate) key: TransitionKey,
    pub(crate) options: TransitionOptions,
    pub(crate) progress: f64,
    pub(crate) phase: Phase,
    pub(crate) is_coordinator: bool,
    pub(crate) completion: Option<Completion>,
    pub(crate) run: Option<Run>,
    pub(crate) driven: bool,
}

impl fmt::Debug for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRecord")
            .field("key", &self.key)
            .field("group", &self.options.group)
            .field("progress", &self.progress)
            .field("phase", &self.phase)
            .field("is_coordinator", &self.is_coordinator)
            .field("has_completion", &self.completion.is_some())
            .field("run", &self.run)
            .field("driven", &self.driven)
            .finish_non_exhaustive()
    }
}

impl TransitionRecord {
    pub(crate) fn new(key: TransitionKey, options: TransitionOptions) -> Self {
        Self {
            key,
            options,
            progress: 0.0,
            phase: Phase::Idle,
            is_coordinator: false,
            completion: None,
            run: None,
            driven: false,
        }
    }

    /// Key this record is tracked under.
    #[must_use]
    pub fn key(&self) -> &TransitionKey {
        &self.key
    }

    /// Group the record belongs to.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.options.group
    }

    /// Current progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether this record is the first member of its group.
    #[must_use]
    pub fn is_coordinator(&self) -> bool {
        self.is_coordinator
    }

    /// Options in effect.
    #[must_use]
    pub fn options(&self) -> &TransitionOptions {
        &self.options
    }

    /// Whether progress is driven directly (scroll) rather than by runs.
    #[must_use]
    pub fn is_driven(&self) -> bool {
        self.driven
    }

    /// Whether a run is in flight (including a pending delay).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Whether a floating copy belongs on screen in this phase.
    #[must_use]
    pub fn shows_floating(&self) -> bool {
        match self.phase {
            Phase::Animating => true,
            Phase::Deactivating => self.run.is_some(),
            Phase::Idle | Phase::Activating | Phase::Settled => false,
        }
    }

    /// Source opacity implied by the current phase.
    ///
    /// A source that is not hidden is dimmed to the complement of the
    /// floating copy's ramp while the copy is on screen.
    #[must_use]
    pub fn source_opacity(&self) -> f64 {
        let floating = self.shows_floating();
        let covered = self.phase == Phase::Settled || floating;
        if self.options.hide_source_when_settled && covered {
            0.0
        } else if floating {
            1.0 - self.options.opacity.at(self.progress)
        } else {
            1.0
        }
    }

    /// Destination opacity implied by the current phase.
    #[must_use]
    pub fn destination_opacity(&self) -> f64 {
        if self.phase == Phase::Settled { 1.0 } else { 0.0 }
    }
}
