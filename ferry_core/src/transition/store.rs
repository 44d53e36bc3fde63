// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Record storage, activation edges and group membership.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::anchor::TransitionKey;
use crate::animation::Run;
use crate::dirty;
use crate::geometry::clamp01;
use crate::registry::{AnchorRegistry, PassSummary};
use crate::time::{Duration, HostTime};
use crate::trace::Direction;

use super::evaluate::{EdgeReport, PhaseChange};
use super::id::{GroupId, TransitionId};
use super::record::{Completion, Phase, TransitionOptions, TransitionRecord};

/// Owner of every live transition record.
///
/// Records are addressed by [`TransitionId`] handles or by key. Torn-down
/// records free their slot for reuse, and generation counters prevent stale
/// handle access.
///
/// The store never reads a clock. Edges carry the host time at which they
/// happened and [`evaluate`](Self::evaluate) advances runs to the frame's
/// time.
#[derive(Debug)]
pub struct TransitionStore {
    // -- Records --
    pub(crate) records: Vec<Option<TransitionRecord>>,
    pub(crate) by_key: BTreeMap<TransitionKey, u32>,
    pub(crate) groups: BTreeMap<GroupId, Vec<u32>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Pending reports, moved out by evaluate --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<TransitionKey>,
    pub(crate) pending_edges: Vec<EdgeReport>,
    pub(crate) pending_phases: Vec<PhaseChange>,
}

impl Default for TransitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            by_key: BTreeMap::new(),
            groups: BTreeMap::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_edges: Vec::new(),
            pending_phases: Vec::new(),
        }
    }

    // -- Edges --

    /// Handles an activation edge for `key`.
    ///
    /// A new record is created on first activation and its key is pinned in
    /// `registry` until teardown. Its forward run starts after the animation
    /// delay plus its group stagger. An existing record is redirected toward
    /// 1 from its current progress instead; no second record is ever created
    /// for the same key. Activating a record already heading to (or resting
    /// at) 1 is a no-op.
    ///
    /// `completion` replaces the record's callback when given. Group
    /// membership is fixed when the record is created.
    pub fn begin(
        &mut self,
        registry: &mut AnchorRegistry,
        key: impl Into<TransitionKey>,
        options: TransitionOptions,
        completion: Option<Completion>,
        now: HostTime,
    ) -> TransitionId {
        let key = key.into();
        let idx = match self.by_key.get(&key) {
            Some(&idx) => {
                self.reconfigure(idx, options);
                idx
            }
            None => self.allocate(registry, key, options),
        };
        if let Some(rec) = self.slot_mut(idx) {
            rec.driven = false;
            if completion.is_some() {
                rec.completion = completion;
            }
        }
        self.start_toward(idx, 1.0, now);
        self.id_at(idx)
    }

    /// Handles a deactivation edge for `key`.
    ///
    /// A settled record starts its reverse run after the animation delay
    /// plus its group stagger. A record still running forward is redirected
    /// toward 0 from its current progress. Unknown keys are ignored.
    pub fn end(&mut self, key: &TransitionKey, now: HostTime) {
        if let Some(&idx) = self.by_key.get(key) {
            self.start_toward(idx, 0.0, now);
        }
    }

    /// Activates every key in `keys` as members of `group`, in order.
    ///
    /// The first member of the group is its coordinator; `completion` is
    /// attached to it and fires once per run of the whole group.
    pub fn begin_group<K: Into<TransitionKey>>(
        &mut self,
        registry: &mut AnchorRegistry,
        group: GroupId,
        keys: impl IntoIterator<Item = K>,
        options: TransitionOptions,
        completion: Option<Completion>,
        now: HostTime,
    ) -> Vec<TransitionId> {
        let options = options.with_group(group);
        let ids: Vec<TransitionId> = keys
            .into_iter()
            .map(|key| self.begin(registry, key, options, None, now))
            .collect();
        if completion.is_some()
            && let Some(&coordinator) = self.groups.get(&group).and_then(|m| m.first())
            && let Some(rec) = self.slot_mut(coordinator)
        {
            rec.completion = completion;
        }
        ids
    }

    /// Deactivates every member of `group`, in member order.
    pub fn end_group(&mut self, group: GroupId, now: HostTime) {
        let members = self.groups.get(&group).cloned().unwrap_or_default();
        for idx in members {
            self.start_toward(idx, 0.0, now);
        }
    }

    /// Sets the progress of a scroll-driven record directly.
    ///
    /// Creates the record if needed and cancels any run in flight. The phase
    /// follows the value: `Idle` at 0, `Settled` at 1, `Animating` between.
    /// Driven records never fire completions and are only torn down by
    /// [`remove`](Self::remove).
    pub fn drive(
        &mut self,
        registry: &mut AnchorRegistry,
        key: impl Into<TransitionKey>,
        progress: f64,
        options: TransitionOptions,
    ) -> TransitionId {
        debug_assert!(progress.is_finite(), "non-finite driven progress");
        let key = key.into();
        let idx = match self.by_key.get(&key) {
            Some(&idx) => {
                self.reconfigure(idx, options);
                idx
            }
            None => self.allocate(registry, key, options),
        };
        let progress = clamp01(progress);
        let Some(rec) = self.slot_mut(idx) else {
            return self.id_at(idx);
        };
        rec.driven = true;
        rec.run = None;
        let moved = rec.progress != progress;
        rec.progress = progress;
        if moved {
            self.dirty.mark(idx, dirty::PROGRESS);
        }
        let phase = if progress <= 0.0 {
            Phase::Idle
        } else if progress >= 1.0 {
            Phase::Settled
        } else {
            Phase::Animating
        };
        self.set_phase(idx, phase);
        self.id_at(idx)
    }

    /// Tears down the record for `key` immediately, without firing its
    /// completion. Unknown keys are ignored.
    pub fn remove(&mut self, registry: &mut AnchorRegistry, key: &TransitionKey) {
        if let Some(&idx) = self.by_key.get(key) {
            let _ = self.teardown(idx, registry);
        }
    }

    /// Marks records whose anchors changed in the committed pass.
    pub fn mark_geometry(&mut self, summary: &PassSummary) {
        for key in &summary.changed_keys {
            if let Some(&idx) = self.by_key.get(key) {
                self.dirty.mark(idx, dirty::GEOMETRY);
            }
        }
    }

    // -- Accessors --

    /// Returns the record for `key`, if one is live.
    #[must_use]
    pub fn record(&self, key: &TransitionKey) -> Option<&TransitionRecord> {
        self.by_key.get(key).and_then(|&idx| self.slot(idx))
    }

    /// Returns the handle of the record for `key`, if one is live.
    #[must_use]
    pub fn id_of(&self, key: &TransitionKey) -> Option<TransitionId> {
        self.by_key.get(key).map(|&idx| self.id_at(idx))
    }

    /// Returns the record behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn get(&self, id: TransitionId) -> &TransitionRecord {
        self.validate(id);
        match self.slot(id.idx) {
            Some(rec) => rec,
            None => panic!("stale TransitionId"),
        }
    }

    /// Returns whether the given handle refers to a live record.
    #[must_use]
    pub fn is_alive(&self, id: TransitionId) -> bool {
        self.generation.get(id.idx as usize) == Some(&id.generation) && self.slot(id.idx).is_some()
    }

    /// Returns the record in slot `idx`, as reported by
    /// [`TransitionChanges`](super::TransitionChanges).
    #[must_use]
    pub fn record_at(&self, idx: u32) -> Option<&TransitionRecord> {
        self.slot(idx)
    }

    /// Iterates live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TransitionId, &TransitionRecord)> + '_ {
        self.records.iter().enumerate().filter_map(|(i, rec)| {
            #[expect(clippy::cast_possible_truncation, reason = "slot count fits in u32")]
            let idx = i as u32;
            rec.as_ref().map(|rec| (self.id_at(idx), rec))
        })
    }

    /// Iterates the members of `group` in coordinator-first order.
    pub fn group_members(&self, group: GroupId) -> impl Iterator<Item = TransitionId> + '_ {
        self.groups
            .get(&group)
            .into_iter()
            .flatten()
            .map(|&idx| self.id_at(idx))
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether no records are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // -- Internals --

    pub(crate) fn slot(&self, idx: u32) -> Option<&TransitionRecord> {
        self.records.get(idx as usize).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, idx: u32) -> Option<&mut TransitionRecord> {
        self.records.get_mut(idx as usize).and_then(Option::as_mut)
    }

    pub(crate) fn id_at(&self, idx: u32) -> TransitionId {
        TransitionId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn validate(&self, id: TransitionId) {
        assert!(self.is_alive(id), "stale TransitionId");
    }

    fn allocate(
        &mut self,
        registry: &mut AnchorRegistry,
        key: TransitionKey,
        options: TransitionOptions,
    ) -> u32 {
        let record = TransitionRecord::new(key.clone(), options);
        let idx = if let Some(idx) = self.free_list.pop() {
            self.records[idx as usize] = Some(record);
            idx
        } else {
            #[expect(clippy::cast_possible_truncation, reason = "slot count fits in u32")]
            let idx = self.records.len() as u32;
            self.records.push(Some(record));
            self.generation.push(0);
            idx
        };
        registry.retain(&key);
        self.by_key.insert(key, idx);
        if let Some(group) = options.group {
            self.join_group(idx, group);
        }
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::LIFECYCLE);
        idx
    }

    /// Refreshes a live record's options, keeping its group membership.
    fn reconfigure(&mut self, idx: u32, options: TransitionOptions) {
        if let Some(rec) = self.slot_mut(idx) {
            let group = rec.options.group;
            rec.options = TransitionOptions { group, ..options };
        }
    }

    fn join_group(&mut self, idx: u32, group: GroupId) {
        let members = self.groups.entry(group).or_default();
        let coordinator = members.first().copied();
        members.push(idx);
        match coordinator {
            Some(coordinator) => {
                let _ = self.dirty.add_dependency(idx, coordinator, dirty::VISIBILITY);
            }
            None => {
                if let Some(rec) = self.slot_mut(idx) {
                    rec.is_coordinator = true;
                }
            }
        }
    }

    /// Removes `idx` from its group, promoting the next member to
    /// coordinator if needed.
    fn leave_group(&mut self, idx: u32, group: GroupId) {
        let Some(members) = self.groups.get_mut(&group) else {
            return;
        };
        let was_coordinator = members.first() == Some(&idx);
        members.retain(|&m| m != idx);
        if members.is_empty() {
            self.groups.remove(&group);
            return;
        }
        if !was_coordinator {
            self.dirty.remove_dependency(idx, members[0], dirty::VISIBILITY);
            return;
        }
        let members = members.clone();
        let promoted = members[0];
        for &m in &members[1..] {
            self.dirty.remove_dependency(m, idx, dirty::VISIBILITY);
            let _ = self.dirty.add_dependency(m, promoted, dirty::VISIBILITY);
        }
        if let Some(rec) = self.slot_mut(promoted) {
            rec.is_coordinator = true;
        }
    }

    /// Delay added to a run starting from rest, from the record's position
    /// in its group.
    fn stagger_delay(&self, idx: u32) -> Duration {
        let Some(rec) = self.slot(idx) else {
            return Duration::ZERO;
        };
        let position = rec
            .options
            .group
            .and_then(|g| self.groups.get(&g))
            .and_then(|members| members.iter().position(|&m| m == idx))
            .unwrap_or(0);
        #[expect(clippy::cast_possible_truncation, reason = "group sizes fit in u32")]
        let position = position as u32;
        rec.options.stagger * position
    }

    /// Points the record at `target` (0 or 1), starting, redirecting or
    /// cancelling its run.
    fn start_toward(&mut self, idx: u32, target: f64, now: HostTime) {
        let id = self.id_at(idx);
        let stagger = self.stagger_delay(idx);
        let Some(rec) = self.slot_mut(idx) else {
            return;
        };
        if rec.run.is_some_and(|run| run.to == target) {
            return;
        }
        let resting = rec.run.is_none()
            && rec.progress == target
            && if target >= 1.0 {
                rec.phase == Phase::Settled
            } else {
                matches!(rec.phase, Phase::Idle | Phase::Deactivating)
            };
        if resting {
            return;
        }

        let from = rec.progress;
        let spec = rec.options.animation;
        let started = rec.run.is_some_and(|run| now >= run.start);
        let redirected = rec.run.is_some() || (from > 0.0 && from < 1.0);
        let forward = target >= 1.0;

        let phase = if from == target && forward {
            // A reverse run that never started: back to rest at 1.
            rec.run = None;
            Phase::Settled
        } else if from == target {
            rec.run = Some(Run::immediate(from, target, now, spec.with_duration(Duration::ZERO)));
            Phase::Deactivating
        } else if started || (from > 0.0 && from < 1.0) {
            rec.run = Some(Run::immediate(from, target, now, spec));
            if forward { Phase::Animating } else { Phase::Deactivating }
        } else {
            rec.run = Some(Run::new(from, target, now, spec, stagger));
            if forward { Phase::Activating } else { Phase::Deactivating }
        };
        rec.driven = false;

        self.pending_edges.push(EdgeReport {
            id,
            key: rec.key.clone(),
            group: rec.options.group,
            direction: if forward {
                Direction::Forward
            } else {
                Direction::Reverse
            },
            from_progress: from,
            redirected,
        });
        self.set_phase(idx, phase);
    }

    /// Moves a record to `to`, recording the change and marking visibility.
    pub(crate) fn set_phase(&mut self, idx: u32, to: Phase) {
        let id = self.id_at(idx);
        let Some(rec) = self.slot_mut(idx) else {
            return;
        };
        let from = rec.phase;
        if from == to {
            return;
        }
        rec.phase = to;
        let key = rec.key.clone();
        self.pending_phases.push(PhaseChange { id, key, from, to });
        self.dirty.mark(idx, dirty::VISIBILITY);
    }

    /// Destroys the record in `idx`, releasing its anchors.
    pub(crate) fn teardown(
        &mut self,
        idx: u32,
        registry: &mut AnchorRegistry,
    ) -> Option<TransitionRecord> {
        let id = self.id_at(idx);
        let rec = self.records.get_mut(idx as usize)?.take()?;
        if let Some(group) = rec.options.group {
            self.leave_group(idx, group);
        }
        self.by_key.remove(&rec.key);
        registry.release(&rec.key);

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);

        if rec.phase != Phase::Idle {
            self.pending_phases.push(PhaseChange {
                id,
                key: rec.key.clone(),
                from: rec.phase,
                to: Phase::Idle,
            });
        }
        self.pending_added.retain(|&a| a != idx);
        self.pending_removed.push(rec.key.clone());
        Some(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{Role, Slot};
    use crate::animation::AnimationSpec;

    fn ms(v: u64) -> HostTime {
        HostTime(Duration::from_millis(v).nanos())
    }

    fn linear() -> TransitionOptions {
        TransitionOptions::default()
            .with_animation(AnimationSpec::linear(Duration::from_millis(100)))
    }

    #[test]
    fn begin_creates_one_record_and_pins_key() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let id = store.begin(&mut registry, "card-1", linear(), None, ms(0));
        assert!(store.is_alive(id));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).phase(), Phase::Activating);
        assert!(registry.is_retained(&TransitionKey::new("card-1")));

        // Duplicate activation does not create a second record.
        let again = store.begin(&mut registry, "card-1", linear(), None, ms(10));
        assert_eq!(again, id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn group_members_are_ordered_and_first_coordinates() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let keys = ["a", "b", "c"];
        let ids = store.begin_group(&mut registry, GroupId(1), keys, linear(), None, ms(0));
        assert_eq!(ids.len(), 3);
        let members: Vec<_> = store.group_members(GroupId(1)).collect();
        assert_eq!(members, ids);
        assert!(store.get(ids[0]).is_coordinator());
        assert!(!store.get(ids[1]).is_coordinator());
    }

    #[test]
    fn stagger_offsets_start_times_by_position() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let options = linear()
            .with_stagger(Duration::from_millis(30))
            .with_animation(
                AnimationSpec::linear(Duration::from_millis(100))
                    .with_delay(Duration::from_millis(10)),
            );
        store.begin_group(&mut registry, GroupId(2), ["a", "b", "c"], options, None, ms(0));
        let starts: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|k| {
                let rec = store.record(&TransitionKey::new(*k)).unwrap();
                (rec.run.unwrap().start, rec.run.unwrap().duration)
            })
            .collect();
        assert_eq!(starts[0], (ms(10), Duration::from_millis(100)));
        assert_eq!(starts[1], (ms(40), Duration::from_millis(100)));
        assert_eq!(starts[2], (ms(70), Duration::from_millis(100)));
    }

    #[test]
    fn end_on_unknown_key_is_ignored() {
        let mut store = TransitionStore::new();
        store.end(&TransitionKey::new("nope"), ms(0));
        assert!(store.is_empty());
    }

    #[test]
    fn drive_sets_phase_from_value() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let header = TransitionOptions::default();
        let id = store.drive(&mut registry, "header", 0.0, header);
        assert_eq!(store.get(id).phase(), Phase::Idle);
        store.drive(&mut registry, "header", 0.4, header);
        assert_eq!(store.get(id).phase(), Phase::Animating);
        store.drive(&mut registry, "header", 7.0, header);
        assert_eq!(store.get(id).phase(), Phase::Settled);
        assert_eq!(store.get(id).progress(), 1.0);
        assert!(store.get(id).is_driven());
    }

    #[test]
    fn remove_frees_slot_and_stales_handle() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let id = store.drive(&mut registry, "header", 0.5, TransitionOptions::default());
        store.remove(&mut registry, &TransitionKey::new("header"));
        assert!(!store.is_alive(id));
        assert!(!registry.is_retained(&TransitionKey::new("header")));

        let reused = store.drive(&mut registry, "other", 0.5, TransitionOptions::default());
        assert_eq!(reused.index(), id.index());
        assert_ne!(reused.generation(), id.generation());
    }

    #[test]
    #[should_panic(expected = "stale TransitionId")]
    fn get_with_stale_handle_panics() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let id = store.drive(&mut registry, "header", 0.5, TransitionOptions::default());
        store.remove(&mut registry, &TransitionKey::new("header"));
        let _ = store.get(id);
    }

    #[test]
    fn removing_coordinator_promotes_next_member() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        let ids = store.begin_group(&mut registry, GroupId(4), ["a", "b"], linear(), None, ms(0));
        store.remove(&mut registry, &TransitionKey::new("a"));
        assert!(store.get(ids[1]).is_coordinator());
        assert_eq!(store.group_members(GroupId(4)).count(), 1);
    }

    #[test]
    fn mark_geometry_ignores_unknown_keys() {
        let mut registry = AnchorRegistry::new();
        let mut store = TransitionStore::new();
        store.begin(&mut registry, "a", linear(), None, ms(0));
        registry.begin_pass();
        let unit = kurbo::Rect::new(0.0, 0.0, 1.0, 1.0);
        registry.publish("a", Role::Source, Slot::Content, unit);
        registry.publish("z", Role::Source, Slot::Content, unit);
        let summary = registry.commit();
        store.mark_geometry(&summary);
        let changes = store.evaluate(ms(0), &mut registry);
        assert_eq!(changes.geometry, &[0]);
    }
}
