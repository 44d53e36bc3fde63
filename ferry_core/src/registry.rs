// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-scoped anchor aggregation.
//!
//! View subtrees that know nothing about each other publish anchors into a
//! shared [`AnchorRegistry`] while they lay out. Publication happens in
//! *passes*:
//!
//! ```text
//!   begin_pass()
//!     publish(..)  publish(..)  publish(..)     (any order, any subtree)
//!   commit() ──► AnchorSnapshot (consistent, read by the transition store)
//! ```
//!
//! # Merge policy
//!
//! Within a pass the last publish for an identity `(key, role, slot)` wins
//! and moves that identity to the end of the publication order. The
//! committed [`AnchorSnapshot`] therefore lists every identity once, ordered
//! by when it was last written, which is what
//! [`select_live`](AnchorSnapshot::select_live) relies on to pick the most
//! recently published candidate.
//!
//! # Retention
//!
//! A committed snapshot only contains what was published during the pass,
//! except for keys pinned with [`retain`](AnchorRegistry::retain): their
//! previous anchors are carried forward when their subtree stops publishing
//! (for instance a source view that left the hierarchy once its transition
//! settled), so a later reverse run still has geometry to interpolate from.
//! Carried anchors keep their original [`Revision`] and sort before fresh
//! publications.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use kurbo::Rect;

use crate::anchor::{Anchor, AnchorPair, Revision, Role, Slot, TransitionKey};

/// The merged anchor table as of one committed pass.
#[derive(Clone, Debug, Default)]
pub struct AnchorSnapshot {
    revision: Revision,
    anchors: Vec<Anchor>,
}

impl AnchorSnapshot {
    /// Revision of the pass that produced this snapshot.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// All anchors, oldest write first.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Number of live anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if no anchors are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Looks up the anchor with the given identity.
    #[must_use]
    pub fn get(&self, key: &TransitionKey, role: Role, slot: Slot) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.matches(key, role, slot))
    }

    /// Returns `true` if any anchor is published under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &TransitionKey) -> bool {
        self.anchors.iter().any(|a| a.key == *key)
    }

    /// Resolves both ends of `key` in `slot`.
    ///
    /// Returns `None` until both the source and the destination have been
    /// published; callers skip rendering for that frame.
    #[must_use]
    pub fn pair(&self, key: &TransitionKey, slot: Slot) -> Option<AnchorPair> {
        let source = self.get(key, Role::Source, slot)?;
        let destination = self.get(key, Role::Destination, slot)?;
        Some(AnchorPair {
            source: source.bounds,
            destination: destination.bounds,
        })
    }

    /// Picks the most recently published key that is ready to animate in
    /// `slot`.
    ///
    /// Publications are scanned newest first. The first key whose source has
    /// an anchor in `slot` is a candidate; it is returned only if its
    /// destination anchor in `slot` exists as well, otherwise the scan falls
    /// through to older candidates.
    #[must_use]
    pub fn select_live(&self, slot: Slot) -> Option<(&TransitionKey, AnchorPair)> {
        self.anchors
            .iter()
            .rev()
            .filter(|a| a.role == Role::Source && a.slot == slot)
            .find_map(|a| self.pair(&a.key, slot).map(|pair| (&a.key, pair)))
    }
}

/// Summary of one [`AnchorRegistry::commit`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Revision assigned to the committed snapshot.
    pub revision: Revision,
    /// Number of identities published during the pass.
    pub published: usize,
    /// Number of retained identities carried over from the previous pass.
    pub carried: usize,
    /// Number of publications rejected for non-finite bounds.
    pub rejected: usize,
    /// Keys whose anchors were added, moved, resized or removed.
    pub changed_keys: Vec<TransitionKey>,
}

/// Anything that can publish anchors during a pass.
///
/// Implemented by the host's view glue; the registry does not care where in
/// the tree a publisher lives.
pub trait AnchorPublisher {
    /// Publishes this component's anchors into `registry`.
    fn publish_anchors(&self, registry: &mut AnchorRegistry);
}

/// Identity of an anchor within a pass.
type AnchorIdentity = (TransitionKey, Role, Slot);

fn identity(anchor: &Anchor) -> AnchorIdentity {
    (anchor.key.clone(), anchor.role, anchor.slot)
}

/// Collects anchors from disjoint subtrees and exposes a consistent snapshot.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    snapshot: AnchorSnapshot,
    /// Publications in write order; overwritten entries are vacated.
    staged: Vec<Option<Anchor>>,
    /// Position of each identity's latest publication in `staged`.
    staged_index: BTreeMap<AnchorIdentity, usize>,
    rejected: usize,
    retained: BTreeMap<TransitionKey, u32>,
}

impl AnchorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass, discarding anything staged but not committed.
    pub fn begin_pass(&mut self) {
        self.staged.clear();
        self.staged_index.clear();
        self.rejected = 0;
    }

    /// Publishes `bounds` for the identity `(key, role, slot)`.
    ///
    /// A later publish for the same identity in the same pass replaces this
    /// one. Non-finite bounds are dropped.
    pub fn publish(&mut self, key: impl Into<TransitionKey>, role: Role, slot: Slot, bounds: Rect) {
        if !bounds.is_finite() {
            self.rejected += 1;
            return;
        }
        let key = key.into();
        let position = self.staged.len();
        if let Some(previous) = self.staged_index.insert((key.clone(), role, slot), position) {
            self.staged[previous] = None;
        }
        self.staged.push(Some(Anchor {
            key,
            role,
            slot,
            bounds,
            captured_at: Revision(self.snapshot.revision.0 + 1),
        }));
    }

    /// Runs a whole pass over `publishers` in order and commits it.
    pub fn collect(&mut self, publishers: &[&dyn AnchorPublisher]) -> PassSummary {
        self.begin_pass();
        for publisher in publishers {
            publisher.publish_anchors(self);
        }
        self.commit()
    }

    /// Commits the staged publications as the new snapshot.
    pub fn commit(&mut self) -> PassSummary {
        let revision = Revision(self.snapshot.revision.0 + 1);
        let staged = core::mem::take(&mut self.staged);
        let staged_index = core::mem::take(&mut self.staged_index);

        let mut anchors: Vec<Anchor> = self
            .snapshot
            .anchors
            .iter()
            .filter(|old| {
                self.retained.contains_key(&old.key)
                    && !staged_index.contains_key(&identity(old))
            })
            .cloned()
            .collect();
        let carried = anchors.len();
        let published = staged_index.len();
        anchors.extend(staged.into_iter().flatten());

        let changed_keys = changed_keys(&self.snapshot.anchors, &anchors);
        self.snapshot = AnchorSnapshot { revision, anchors };

        PassSummary {
            revision,
            published,
            carried,
            rejected: core::mem::take(&mut self.rejected),
            changed_keys,
        }
    }

    /// The most recently committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &AnchorSnapshot {
        &self.snapshot
    }

    /// Pins `key` so its anchors survive passes in which nobody publishes
    /// them. Pins are counted; each `retain` needs a matching
    /// [`release`](Self::release).
    pub fn retain(&mut self, key: &TransitionKey) {
        *self.retained.entry(key.clone()).or_insert(0) += 1;
    }

    /// Drops one pin on `key`. Once unpinned, the key's anchors disappear at
    /// the next commit unless they are published again.
    pub fn release(&mut self, key: &TransitionKey) {
        if let Some(count) = self.retained.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.retained.remove(key);
            }
        }
    }

    /// Returns `true` if `key` is pinned.
    #[must_use]
    pub fn is_retained(&self, key: &TransitionKey) -> bool {
        self.retained.contains_key(key)
    }
}

/// Keys whose anchor set differs between `old` and `new`, sorted.
fn changed_keys(old: &[Anchor], new: &[Anchor]) -> Vec<TransitionKey> {
    let mut previous: BTreeMap<AnchorIdentity, Rect> =
        old.iter().map(|o| (identity(o), o.bounds)).collect();
    let mut changed = BTreeSet::new();
    for a in new {
        if previous.remove(&identity(a)) != Some(a.bounds) {
            changed.insert(a.key.clone());
        }
    }
    // Whatever is left was not published again.
    changed.extend(previous.into_keys().map(|(key, _, _)| key));
    changed.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::from_origin_size((x, y), (w, h))
    }

    #[test]
    fn last_publish_wins_within_a_pass() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("a", Role::Source, Slot::Content, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("a", Role::Source, Slot::Content, rect(5.0, 5.0, 10.0, 10.0));
        let summary = reg.commit();
        assert_eq!(summary.published, 1);
        let anchor = reg
            .snapshot()
            .get(&"a".into(), Role::Source, Slot::Content)
            .unwrap();
        assert_eq!(anchor.bounds, rect(5.0, 5.0, 10.0, 10.0));
        assert_eq!(anchor.captured_at, Revision(1));
    }

    #[test]
    fn republished_identity_moves_to_the_end() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("a", Role::Source, Slot::Title, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("a", Role::Destination, Slot::Title, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("b", Role::Source, Slot::Title, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("b", Role::Destination, Slot::Title, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("a", Role::Source, Slot::Title, rect(5.0, 5.0, 10.0, 10.0));
        let summary = reg.commit();
        assert_eq!(summary.published, 4);
        let order: Vec<_> = reg
            .snapshot()
            .anchors()
            .iter()
            .map(|a| (a.key.as_str(), a.role))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a", Role::Destination),
                ("b", Role::Source),
                ("b", Role::Destination),
                ("a", Role::Source),
            ]
        );
        let (key, pair) = reg.snapshot().select_live(Slot::Title).unwrap();
        assert_eq!(key.as_str(), "a");
        assert_eq!(pair.source, rect(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn pair_requires_both_ends() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("card", Role::Source, Slot::Content, rect(0.0, 0.0, 10.0, 10.0));
        reg.commit();
        assert!(reg.snapshot().pair(&"card".into(), Slot::Content).is_none());

        reg.begin_pass();
        reg.publish("card", Role::Source, Slot::Content, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish("card", Role::Destination, Slot::Content, rect(50.0, 50.0, 100.0, 100.0));
        reg.commit();
        let pair = reg.snapshot().pair(&"card".into(), Slot::Content).unwrap();
        assert_eq!(pair.destination, rect(50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn unretained_anchors_vanish_when_not_republished() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("a", Role::Source, Slot::Content, rect(0.0, 0.0, 1.0, 1.0));
        reg.commit();
        reg.begin_pass();
        let summary = reg.commit();
        assert!(reg.snapshot().is_empty());
        assert_eq!(summary.changed_keys, vec![TransitionKey::new("a")]);
    }

    #[test]
    fn retained_anchors_are_carried_forward() {
        let mut reg = AnchorRegistry::new();
        let key = TransitionKey::new("hero");
        reg.retain(&key);
        reg.begin_pass();
        reg.publish(key.clone(), Role::Source, Slot::Content, rect(0.0, 0.0, 10.0, 10.0));
        reg.publish(key.clone(), Role::Destination, Slot::Content, rect(0.0, 0.0, 90.0, 90.0));
        reg.commit();

        // The source subtree disappears; only the destination republishes.
        reg.begin_pass();
        reg.publish(key.clone(), Role::Destination, Slot::Content, rect(0.0, 0.0, 95.0, 95.0));
        let summary = reg.commit();
        assert_eq!(summary.carried, 1);
        assert_eq!(summary.revision, Revision(2));
        let src = reg.snapshot().get(&key, Role::Source, Slot::Content).unwrap();
        assert_eq!(src.captured_at, Revision(1));
        // Carried anchors sort before fresh ones.
        assert_eq!(reg.snapshot().anchors()[0].role, Role::Source);

        reg.release(&key);
        assert!(!reg.is_retained(&key));
        reg.begin_pass();
        reg.commit();
        assert!(!reg.snapshot().contains_key(&key));
    }

    #[test]
    fn retain_is_counted() {
        let mut reg = AnchorRegistry::new();
        let key = TransitionKey::new("k");
        reg.retain(&key);
        reg.retain(&key);
        reg.release(&key);
        assert!(reg.is_retained(&key));
        reg.release(&key);
        assert!(!reg.is_retained(&key));
        // Extra releases are harmless.
        reg.release(&key);
    }

    #[test]
    fn select_live_prefers_latest_complete_candidate() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        // Older header, complete.
        reg.publish("inbox", Role::Source, Slot::Title, rect(0.0, 100.0, 80.0, 30.0));
        reg.publish("inbox", Role::Destination, Slot::Title, rect(0.0, 0.0, 60.0, 20.0));
        // Newer header without a destination yet.
        reg.publish("drafts", Role::Source, Slot::Title, rect(0.0, 300.0, 80.0, 30.0));
        reg.commit();

        let (key, pair) = reg.snapshot().select_live(Slot::Title).unwrap();
        assert_eq!(key.as_str(), "inbox");
        assert_eq!(pair.source, rect(0.0, 100.0, 80.0, 30.0));

        // Once the newer header gets a destination it wins.
        reg.begin_pass();
        reg.publish("inbox", Role::Source, Slot::Title, rect(0.0, 100.0, 80.0, 30.0));
        reg.publish("inbox", Role::Destination, Slot::Title, rect(0.0, 0.0, 60.0, 20.0));
        reg.publish("drafts", Role::Source, Slot::Title, rect(0.0, 300.0, 80.0, 30.0));
        reg.publish("drafts", Role::Destination, Slot::Title, rect(0.0, 0.0, 60.0, 20.0));
        reg.commit();
        let (key, _) = reg.snapshot().select_live(Slot::Title).unwrap();
        assert_eq!(key.as_str(), "drafts");
    }

    #[test]
    fn select_live_ignores_other_slots() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("a", Role::Source, Slot::Accessory, rect(0.0, 0.0, 1.0, 1.0));
        reg.publish("a", Role::Destination, Slot::Accessory, rect(0.0, 0.0, 1.0, 1.0));
        reg.commit();
        assert!(reg.snapshot().select_live(Slot::Title).is_none());
        assert!(reg.snapshot().select_live(Slot::Accessory).is_some());
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let mut reg = AnchorRegistry::new();
        reg.begin_pass();
        reg.publish("a", Role::Source, Slot::Content, Rect::new(0.0, f64::NAN, 1.0, 1.0));
        let summary = reg.commit();
        assert_eq!(summary.rejected, 1);
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn changed_keys_ignore_stable_geometry() {
        let mut reg = AnchorRegistry::new();
        for _ in 0..2 {
            reg.begin_pass();
            reg.publish("still", Role::Source, Slot::Content, rect(0.0, 0.0, 5.0, 5.0));
            reg.publish("moving", Role::Source, Slot::Content, rect(0.0, 0.0, 5.0, 5.0));
            reg.commit();
        }
        reg.begin_pass();
        reg.publish("still", Role::Source, Slot::Content, rect(0.0, 0.0, 5.0, 5.0));
        reg.publish("moving", Role::Source, Slot::Content, rect(1.0, 0.0, 5.0, 5.0));
        let summary = reg.commit();
        assert_eq!(summary.changed_keys, vec![TransitionKey::new("moving")]);
    }

    #[test]
    fn collect_runs_publishers_in_order() {
        struct Thumb;
        impl AnchorPublisher for Thumb {
            fn publish_anchors(&self, registry: &mut AnchorRegistry) {
                registry.publish("photo", Role::Source, Slot::Content, rect(0.0, 0.0, 40.0, 40.0));
            }
        }
        struct Detail;
        impl AnchorPublisher for Detail {
            fn publish_anchors(&self, registry: &mut AnchorRegistry) {
                let bounds = rect(0.0, 0.0, 400.0, 400.0);
                registry.publish("photo", Role::Destination, Slot::Content, bounds);
            }
        }

        let mut reg = AnchorRegistry::new();
        let summary = reg.collect(&[&Thumb, &Detail]);
        assert_eq!(summary.published, 2);
        assert!(reg.snapshot().pair(&"photo".into(), Slot::Content).is_some());
    }
}
