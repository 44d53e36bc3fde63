// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition plan: what the overlay draws for one frame.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use ferry_core::anchor::TransitionKey;
use ferry_core::registry::AnchorSnapshot;
use ferry_core::time::HostTime;
use ferry_core::trace::Tracer;
use ferry_core::transition::{FloatingFrame, TransitionFrame, TransitionId, TransitionStore};
use kurbo::{Affine, Rect, RoundedRect, Size, Vec2};

use crate::damage::DamageRegion;
use crate::strategy::{ContentRequest, FloatingContent, MirroringBackend, StrategyResolver};

/// One floating copy to draw.
///
/// Items are produced in record slot order.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatingItem {
    /// Record this item originates from.
    pub id: TransitionId,
    /// Record key.
    pub key: TransitionKey,
    /// What to draw.
    pub content: FloatingContent,
    /// On-screen rectangle.
    pub rect: Rect,
    /// Maps a copy laid out at the origin with [`size`](Self::size) onto
    /// [`rect`](Self::rect).
    pub transform: Affine,
    /// Untransformed size of the copy (the source size).
    pub size: Size,
    /// Opacity.
    pub opacity: f64,
    /// Corner radius in on-screen units, if any.
    pub corner_radius: Option<f64>,
}

impl FloatingItem {
    /// On-screen shape, with the corner radius applied.
    #[must_use]
    pub fn shape(&self) -> RoundedRect {
        self.rect.to_rounded_rect(self.corner_radius.unwrap_or(0.0))
    }
}

/// Opacities the host applies to the real source and destination elements.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityItem {
    /// Record key.
    pub key: TransitionKey,
    /// Source element opacity.
    pub source_opacity: f64,
    /// Destination element opacity.
    pub destination_opacity: f64,
}

/// Everything the overlay needs for one frame.
#[derive(Clone, Debug, Default)]
pub struct TransitionPlan {
    /// Floating copies in record order.
    pub floating: Vec<FloatingItem>,
    /// Source and destination opacities for every record with anchors.
    pub visibility: Vec<VisibilityItem>,
    /// Area that changed since the previous plan.
    pub damage: DamageRegion,
}

impl TransitionPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.floating.clear();
        self.visibility.clear();
        self.damage = DamageRegion::None;
    }

    /// Hands every mirrored item to `backend`.
    pub fn present_mirrors(&self, backend: &mut dyn MirroringBackend) {
        for item in &self.floating {
            if let FloatingContent::Mirror(source) = item.content {
                backend.present_mirror(source, item.rect, item.opacity);
            }
        }
    }
}

/// What was drawn for one key, for damage computation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Drawn {
    floating: Option<(Rect, f64)>,
    source: Rect,
    destination: Rect,
    source_opacity: f64,
    destination_opacity: f64,
}

impl Drawn {
    fn damage_against(&self, prev: Option<&Self>, damage: &mut DamageRegion) {
        let Some(prev) = prev else {
            if let Some((rect, _)) = self.floating {
                damage.add(rect);
            }
            damage.add(self.source);
            damage.add(self.destination);
            return;
        };
        if prev.floating != self.floating {
            if let Some((rect, _)) = prev.floating {
                damage.add(rect);
            }
            if let Some((rect, _)) = self.floating {
                damage.add(rect);
            }
        }
        if prev.source_opacity != self.source_opacity || prev.source != self.source {
            damage.add(prev.source);
            damage.add(self.source);
        }
        if prev.destination_opacity != self.destination_opacity
            || prev.destination != self.destination
        {
            damage.add(prev.destination);
            damage.add(self.destination);
        }
    }

    fn damage_vacated(&self, damage: &mut DamageRegion) {
        if let Some((rect, _)) = self.floating {
            damage.add(rect);
        }
        damage.add(self.source);
        damage.add(self.destination);
    }
}

/// Builds a [`TransitionPlan`] from the store each frame.
///
/// Holds the content registered for each key, the resolved strategy of each
/// transition, and what was drawn last frame for damage tracking. The first
/// plan reports [`DamageRegion::Full`].
#[derive(Debug)]
pub struct PlanBuilder {
    requests: BTreeMap<TransitionKey, ContentRequest>,
    resolver: StrategyResolver,
    previous: BTreeMap<TransitionKey, Drawn>,
    first_frame: bool,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanBuilder {
    /// Creates a builder with no registered content.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            resolver: StrategyResolver::new(),
            previous: BTreeMap::new(),
            first_frame: true,
        }
    }

    /// Registers what the floating copy of `key` shows.
    ///
    /// Records without registered content still get visibility items but no
    /// floating item. Replacing the content of a key resolves it again on
    /// the next build.
    pub fn set_content(&mut self, key: impl Into<TransitionKey>, request: ContentRequest) {
        let key = key.into();
        if self.requests.get(&key) != Some(&request) {
            self.resolver.forget([&key]);
        }
        self.requests.insert(key, request);
    }

    /// Removes the registered content of `key`.
    pub fn clear_content(&mut self, key: &TransitionKey) {
        self.requests.remove(key);
        self.resolver.forget([key]);
    }

    /// Strategy resolved for `key`, if its floating copy has been drawn.
    #[must_use]
    pub fn resolved(&self, key: &TransitionKey) -> Option<FloatingContent> {
        self.resolver.get(key)
    }

    /// Builds the plan for `now`.
    pub fn build(
        &mut self,
        now: HostTime,
        store: &TransitionStore,
        snapshot: &AnchorSnapshot,
        backend: &dyn MirroringBackend,
        tracer: &mut Tracer<'_>,
    ) -> TransitionPlan {
        let mut plan = TransitionPlan::new();
        self.build_into(now, store, snapshot, backend, tracer, &mut plan);
        plan
    }

    /// Like [`build`](Self::build), but reuses a caller-provided plan.
    pub fn build_into(
        &mut self,
        now: HostTime,
        store: &TransitionStore,
        snapshot: &AnchorSnapshot,
        backend: &dyn MirroringBackend,
        tracer: &mut Tracer<'_>,
        plan: &mut TransitionPlan,
    ) {
        plan.clear();
        let mut damage = if self.first_frame {
            DamageRegion::Full
        } else {
            DamageRegion::None
        };
        let mut drawn = BTreeMap::new();

        for frame in store.frames(snapshot) {
            plan.visibility.push(VisibilityItem {
                key: frame.key.clone(),
                source_opacity: frame.source_opacity,
                destination_opacity: frame.destination_opacity,
            });

            let item = match (frame.floating, self.requests.get(frame.key)) {
                (Some(floating), Some(&request)) => {
                    let content =
                        self.resolver.resolve(frame.key, frame.id, request, backend, tracer);
                    Some(floating_item(&frame, &floating, content))
                }
                _ => None,
            };

            let now_drawn = Drawn {
                floating: item.as_ref().map(|i| (i.rect, i.opacity)),
                source: frame.anchors.source,
                destination: frame.anchors.destination,
                source_opacity: frame.source_opacity,
                destination_opacity: frame.destination_opacity,
            };
            now_drawn.damage_against(self.previous.get(frame.key), &mut damage);
            drawn.insert(frame.key.clone(), now_drawn);

            if let Some(item) = item {
                #[cfg(feature = "trace-rich")]
                tracer.frame_geometry(&ferry_core::trace::FrameGeometryEvent {
                    time: now,
                    key: item.key.as_str(),
                    progress: frame.progress,
                    rect: item.rect,
                    opacity: item.opacity,
                });
                plan.floating.push(item);
            }
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = now;
        }

        for (key, prev) in &self.previous {
            if !drawn.contains_key(key) {
                prev.damage_vacated(&mut damage);
                self.resolver.forget([key]);
            }
        }
        self.previous = drawn;
        self.first_frame = false;
        plan.damage = damage;
    }
}

fn floating_item(
    frame: &TransitionFrame<'_>,
    floating: &FloatingFrame,
    content: FloatingContent,
) -> FloatingItem {
    let mut geometry = floating.geometry;
    if content.is_mirror() {
        // Mirrors render at the source's size.
        geometry.scale = Vec2::new(1.0, 1.0);
    }
    let scale = geometry.scale.x.abs().min(geometry.scale.y.abs());
    FloatingItem {
        id: frame.id,
        key: frame.key.clone(),
        content,
        rect: geometry.rect(),
        transform: geometry.transform(),
        size: geometry.size,
        opacity: floating.opacity,
        corner_radius: floating.corner_radius.map(|r| r * scale),
    }
}
