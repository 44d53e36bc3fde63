// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame resolution of what a record draws.

use crate::anchor::{AnchorPair, TransitionKey};
use crate::geometry::{Interpolated, dynamic_offset, interpolate};
use crate::registry::AnchorSnapshot;

use super::id::TransitionId;
use super::record::{Phase, TransitionRecord};
use super::store::TransitionStore;

/// Geometry and styling of the floating copy for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatingFrame {
    /// Interpolated position and scale.
    pub geometry: Interpolated,
    /// Floating copy opacity.
    pub opacity: f64,
    /// Interpolated corner radius, if the record has a corner spec.
    pub corner_radius: Option<f64>,
}

/// What one record draws this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionFrame<'a> {
    /// Record handle.
    pub id: TransitionId,
    /// Record key.
    pub key: &'a TransitionKey,
    /// Current phase.
    pub phase: Phase,
    /// Current progress.
    pub progress: f64,
    /// Source and destination bounds the frame was resolved against.
    pub anchors: AnchorPair,
    /// Opacity to apply to the source element.
    pub source_opacity: f64,
    /// Opacity to apply to the destination element.
    pub destination_opacity: f64,
    /// Floating copy, when the phase shows one.
    pub floating: Option<FloatingFrame>,
}

impl TransitionStore {
    /// Resolves the frame for `id` against `snapshot`.
    ///
    /// Returns `None` for stale handles and while either anchor of the
    /// record's key and slot is missing; the host then leaves the source
    /// and destination untouched for this frame.
    #[must_use]
    pub fn frame<'a>(
        &'a self,
        id: TransitionId,
        snapshot: &AnchorSnapshot,
    ) -> Option<TransitionFrame<'a>> {
        if !self.is_alive(id) {
            return None;
        }
        resolve(id, self.slot(id.idx)?, snapshot)
    }

    /// Like [`frame`](Self::frame), addressed by key.
    #[must_use]
    pub fn frame_for<'a>(
        &'a self,
        key: &TransitionKey,
        snapshot: &AnchorSnapshot,
    ) -> Option<TransitionFrame<'a>> {
        let id = self.id_of(key)?;
        self.frame(id, snapshot)
    }

    /// Resolves every live record that has both anchors, in slot order.
    pub fn frames<'a>(
        &'a self,
        snapshot: &'a AnchorSnapshot,
    ) -> impl Iterator<Item = TransitionFrame<'a>> + 'a {
        self.iter()
            .filter_map(move |(id, rec)| resolve(id, rec, snapshot))
    }
}

fn resolve<'a>(
    id: TransitionId,
    rec: &'a TransitionRecord,
    snapshot: &AnchorSnapshot,
) -> Option<TransitionFrame<'a>> {
    let options = rec.options();
    let pair = snapshot.pair(rec.key(), options.slot)?;
    let t = rec.progress();
    let floating = rec.shows_floating().then(|| FloatingFrame {
        geometry: interpolate(
            pair.source,
            pair.destination,
            t,
            dynamic_offset(t, options.extra_offset_x),
        ),
        opacity: options.opacity.at(t),
        corner_radius: options.corner.map(|c| c.radius_at(t)),
    });
    Some(TransitionFrame {
        id,
        key: rec.key(),
        phase: rec.phase(),
        progress: t,
        anchors: pair,
        source_opacity: rec.source_opacity(),
        destination_opacity: rec.destination_opacity(),
        floating,
    })
}
