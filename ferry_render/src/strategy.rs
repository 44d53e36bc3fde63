// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating content strategies and the mirroring capability probe.
//!
//! A floating copy is drawn either from a host-supplied duplicate surface or
//! by asking a [`MirroringBackend`] to show a live, same-size view of the
//! source. Mirroring is optional: the backend is probed once per transition
//! and an unavailable backend silently degrades to the duplicate strategy,
//! reported through the trace sink.

use alloc::collections::BTreeMap;

use ferry_core::anchor::TransitionKey;
use ferry_core::trace::{FallbackReason, StrategyFallbackEvent, Tracer};
use ferry_core::transition::TransitionId;
use kurbo::Rect;

use crate::resource::{SourceHandle, SurfaceId};

/// What the floating copy shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatingContent {
    /// A host-managed duplicate of the element, scaled to the interpolated
    /// geometry.
    Duplicate(SurfaceId),
    /// A live mirror of the source view, always at the source's size.
    Mirror(SourceHandle),
}

impl FloatingContent {
    /// Whether this content must be presented without scaling.
    #[must_use]
    pub const fn is_mirror(&self) -> bool {
        matches!(self, Self::Mirror(_))
    }
}

/// A platform facility that renders a live copy of a source view elsewhere.
pub trait MirroringBackend {
    /// Whether mirroring works on this platform right now.
    fn is_available(&self) -> bool;

    /// Shows `source` at `rect` (same size as the source) with `opacity`.
    fn present_mirror(&mut self, source: SourceHandle, rect: Rect, opacity: f64);
}

/// A backend that is never available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMirroring;

impl MirroringBackend for NoMirroring {
    fn is_available(&self) -> bool {
        false
    }

    fn present_mirror(&mut self, source: SourceHandle, rect: Rect, opacity: f64) {
        _ = (source, rect, opacity);
    }
}

/// Requested content for one transition, with the duplicate to fall back
/// to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRequest {
    /// Preferred content.
    pub preferred: FloatingContent,
    /// Duplicate used when `preferred` is a mirror and mirroring is
    /// unavailable.
    pub fallback: SurfaceId,
}

impl ContentRequest {
    /// A duplicate-only request.
    #[must_use]
    pub const fn duplicate(surface: SurfaceId) -> Self {
        Self {
            preferred: FloatingContent::Duplicate(surface),
            fallback: surface,
        }
    }

    /// A mirror request falling back to `fallback`.
    #[must_use]
    pub const fn mirror(source: SourceHandle, fallback: SurfaceId) -> Self {
        Self {
            preferred: FloatingContent::Mirror(source),
            fallback,
        }
    }
}

/// Resolves and remembers the content strategy of each transition.
///
/// The backend is probed the first time a transition is resolved; the
/// result is kept for that transition's handle so it never switches strategy
/// mid-flight. A record recreated under the same key has a new handle and is
/// probed again.
#[derive(Clone, Debug, Default)]
pub struct StrategyResolver {
    resolved: BTreeMap<TransitionKey, (TransitionId, FloatingContent)>,
}

impl StrategyResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content to draw for the transition `id` under `key`.
    pub fn resolve(
        &mut self,
        key: &TransitionKey,
        id: TransitionId,
        request: ContentRequest,
        backend: &dyn MirroringBackend,
        tracer: &mut Tracer<'_>,
    ) -> FloatingContent {
        if let Some(&(resolved_for, content)) = self.resolved.get(key)
            && resolved_for == id
        {
            return content;
        }
        let content = match request.preferred {
            FloatingContent::Mirror(_) if !backend.is_available() => {
                tracer.strategy_fallback(&StrategyFallbackEvent {
                    key: key.as_str(),
                    reason: FallbackReason::MirroringUnavailable,
                });
                FloatingContent::Duplicate(request.fallback)
            }
            preferred => preferred,
        };
        self.resolved.insert(key.clone(), (id, content));
        content
    }

    /// Previously resolved content for `key`.
    #[must_use]
    pub fn get(&self, key: &TransitionKey) -> Option<FloatingContent> {
        self.resolved.get(key).map(|&(_, content)| content)
    }

    /// Drops the remembered strategy of `keys`.
    pub fn forget<'a>(&mut self, keys: impl IntoIterator<Item = &'a TransitionKey>) {
        for key in keys {
            self.resolved.remove(key);
        }
    }
}
