// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for host-framework glue.

use crate::plan::TransitionPlan;

/// Applies a [`TransitionPlan`] to the host's overlay and view tree.
///
/// Native integrations and test doubles both implement this trait, enabling
/// generic frame loops.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// fn on_frame(now: HostTime) {
///     // Layout: subtrees publish their anchors.
///     registry.begin_pass();
///     publish_visible_anchors(&mut registry);
///     let summary = registry.commit();
///     store.mark_geometry(&summary);
///
///     // Evaluate: advance runs, fire completions.
///     let changes = store.evaluate(now, &mut registry);
///     changes.emit(now, &mut tracer);
///
///     // Present: resolve floating copies and visibility.
///     let plan = builder.build(now, &store, registry.snapshot(), &backend, &mut tracer);
///     presenter.apply(&plan);
/// }
/// ```
pub trait Presenter {
    /// Applies the given plan.
    fn apply(&mut self, plan: &TransitionPlan);
}
