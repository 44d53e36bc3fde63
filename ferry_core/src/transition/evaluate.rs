// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change reporting.
//!
//! Evaluation advances every record with a run in flight to the frame time,
//! then settles the consequences:
//!
//! 1. **Runs**: sample each run; promote `Activating` records whose start
//!    time passed to `Animating`; finished forward runs move to `Settled`,
//!    finished reverse runs park at 0 in `Deactivating`.
//! 2. **Forward completions**: an ungrouped record fires `completion(true)`.
//!    A group fires its coordinator's completion once every member settled,
//!    and marks the coordinator's `VISIBILITY` eagerly so the flip reaches
//!    every member.
//! 3. **Reverse completions**: an ungrouped parked record is torn down and
//!    fires `completion(false)`. A group is torn down as a whole once every
//!    member parked, firing the coordinator's completion once.
//! 4. **Dirty channels**: drain `PROGRESS`, `VISIBILITY` (with dependents),
//!    `GEOMETRY` and `LIFECYCLE`, and move the pending edge, phase and
//!    lifecycle lists into the result.
//!
//! Like the rest of the store, [`TransitionChanges`] reports raw slot indices
//! for the per-channel lists; use
//! [`record_at`](super::TransitionStore::record_at) to read them without a
//! generation check.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use understory_dirty::EagerPolicy;

use crate::anchor::TransitionKey;
use crate::dirty;
use crate::geometry::clamp01;
use crate::registry::AnchorRegistry;
use crate::time::HostTime;
use crate::trace::{CompletionEvent, Direction, EdgeEvent, PhaseChangeEvent, Tracer};

use super::id::{GroupId, TransitionId};
use super::record::Phase;
use super::store::TransitionStore;

/// An activation or deactivation edge accepted by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeReport {
    /// Record handle.
    pub id: TransitionId,
    /// Record key.
    pub key: TransitionKey,
    /// Group of the record.
    pub group: Option<GroupId>,
    /// Direction of the new run.
    pub direction: Direction,
    /// Progress the run starts from.
    pub from_progress: f64,
    /// Whether an existing run or partial progress was redirected.
    pub redirected: bool,
}

/// One phase change of one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseChange {
    /// Record handle (stale once the record reached `Idle` and was torn down).
    pub id: TransitionId,
    /// Record key.
    pub key: TransitionKey,
    /// Previous phase.
    pub from: Phase,
    /// New phase.
    pub to: Phase,
}

/// A completion that fired during evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionReport {
    /// Key of the record whose callback fired (the coordinator for groups).
    pub key: TransitionKey,
    /// Group covered by the completion.
    pub group: Option<GroupId>,
    /// `true` after a forward run, `false` after a reverse run.
    pub finished: bool,
}

/// The set of changes produced by a single [`TransitionStore::evaluate`]
/// call.
#[derive(Clone, Debug, Default)]
pub struct TransitionChanges {
    /// Records whose progress moved.
    pub progressed: Vec<u32>,
    /// Records whose source, destination or floating visibility may have
    /// changed (including group members reached through their coordinator).
    pub visibility: Vec<u32>,
    /// Records whose anchors changed in a committed pass.
    pub geometry: Vec<u32>,
    /// Records created since the last evaluate.
    pub added: Vec<u32>,
    /// Keys of records torn down since the last evaluate.
    pub removed: Vec<TransitionKey>,
    /// Edges accepted since the last evaluate.
    pub edges: Vec<EdgeReport>,
    /// Phase changes since the last evaluate, in order.
    pub phase_changes: Vec<PhaseChange>,
    /// Completions fired by this evaluate.
    pub completed: Vec<CompletionReport>,
}

impl TransitionChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.progressed.clear();
        self.visibility.clear();
        self.geometry.clear();
        self.added.clear();
        self.removed.clear();
        self.edges.clear();
        self.phase_changes.clear();
        self.completed.clear();
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.progressed.is_empty()
            && self.visibility.is_empty()
            && self.geometry.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.edges.is_empty()
            && self.phase_changes.is_empty()
            && self.completed.is_empty()
    }

    /// Forwards edges, phase changes and completions to `tracer`.
    pub fn emit(&self, now: HostTime, tracer: &mut Tracer<'_>) {
        for edge in &self.edges {
            let e = EdgeEvent {
                time: now,
                id: edge.id,
                key: edge.key.as_str(),
                group: edge.group,
                direction: edge.direction,
                from_progress: edge.from_progress,
                redirected: edge.redirected,
            };
            match edge.direction {
                Direction::Forward => tracer.transition_begin(&e),
                Direction::Reverse => tracer.transition_end(&e),
            }
        }
        for change in &self.phase_changes {
            tracer.phase_change(&PhaseChangeEvent {
                time: now,
                id: change.id,
                key: change.key.as_str(),
                from: change.from,
                to: change.to,
            });
        }
        for done in &self.completed {
            tracer.completion(&CompletionEvent {
                time: now,
                key: done.key.as_str(),
                group: done.group,
                finished: done.finished,
            });
        }
    }
}

impl TransitionStore {
    /// Advances every run to `now` and returns what changed.
    ///
    /// Records torn down here release their keys in `registry`. `now` should
    /// not decrease between calls.
    pub fn evaluate(&mut self, now: HostTime, registry: &mut AnchorRegistry) -> TransitionChanges {
        let mut changes = TransitionChanges::default();
        self.evaluate_into(now, registry, &mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(
        &mut self,
        now: HostTime,
        registry: &mut AnchorRegistry,
        changes: &mut TransitionChanges,
    ) {
        changes.clear();

        let (settled, parked) = self.advance_runs(now);
        self.complete_forward(&settled, changes);
        self.complete_reverse(&parked, registry, changes);

        changes.progressed = self
            .dirty
            .drain(dirty::PROGRESS)
            .deterministic()
            .run()
            .collect();
        changes.visibility = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .deterministic()
            .run()
            .collect();
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::LIFECYCLE)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
        core::mem::swap(&mut self.pending_edges, &mut changes.edges);
        core::mem::swap(&mut self.pending_phases, &mut changes.phase_changes);
    }

    /// Samples every run. Returns the slots whose forward runs finished and
    /// the slots whose reverse runs finished.
    fn advance_runs(&mut self, now: HostTime) -> (Vec<u32>, Vec<u32>) {
        let mut settled = Vec::new();
        let mut parked = Vec::new();
        for slot in 0..self.records.len() {
            #[expect(clippy::cast_possible_truncation, reason = "slot count fits in u32")]
            let idx = slot as u32;
            let Some(rec) = self.records[slot].as_mut() else {
                continue;
            };
            let Some(run) = rec.run else {
                continue;
            };
            let sample = run.sample(now);
            let value = clamp01(sample.value);
            let moved = value != rec.progress;
            rec.progress = value;
            let phase = rec.phase;
            let forward = run.to >= 1.0;
            if sample.finished {
                rec.run = None;
            }
            if moved {
                self.dirty.mark(idx, dirty::PROGRESS);
            }

            if sample.started && phase == Phase::Activating {
                self.set_phase(idx, Phase::Animating);
            }
            if sample.finished {
                if forward {
                    self.set_phase(idx, Phase::Settled);
                    settled.push(idx);
                } else {
                    // Parked at 0; the visibility flip back to the source
                    // happens now even though the phase is unchanged.
                    self.dirty.mark(idx, dirty::VISIBILITY);
                    parked.push(idx);
                }
            }
        }
        (settled, parked)
    }

    fn complete_forward(&mut self, settled: &[u32], changes: &mut TransitionChanges) {
        let mut done = BTreeSet::new();
        for &idx in settled {
            let Some(group) = self.slot(idx).map(|rec| rec.options.group) else {
                continue;
            };
            match group {
                None => self.fire(idx, None, true, changes),
                Some(group) => {
                    if done.contains(&group) || !self.group_all(group, Phase::Settled) {
                        continue;
                    }
                    done.insert(group);
                    if let Some(&coordinator) = self.groups.get(&group).and_then(|m| m.first()) {
                        self.dirty
                            .mark_with(coordinator, dirty::VISIBILITY, &EagerPolicy);
                        self.fire(coordinator, Some(group), true, changes);
                    }
                }
            }
        }
    }

    fn complete_reverse(
        &mut self,
        parked: &[u32],
        registry: &mut AnchorRegistry,
        changes: &mut TransitionChanges,
    ) {
        let mut done = BTreeSet::new();
        for &idx in parked {
            let Some(group) = self.slot(idx).map(|rec| rec.options.group) else {
                continue;
            };
            match group {
                None => {
                    if let Some(mut rec) = self.teardown(idx, registry) {
                        if let Some(completion) = rec.completion.as_mut() {
                            completion(false);
                        }
                        changes.completed.push(CompletionReport {
                            key: rec.key,
                            group: None,
                            finished: false,
                        });
                    }
                }
                Some(group) => {
                    if done.contains(&group) || !self.group_all(group, Phase::Deactivating) {
                        continue;
                    }
                    done.insert(group);
                    let members = self.groups.get(&group).cloned().unwrap_or_default();
                    let mut coordinator = None;
                    for member in members {
                        if let Some(rec) = self.teardown(member, registry)
                            && coordinator.is_none()
                        {
                            coordinator = Some(rec);
                        }
                    }
                    if let Some(mut rec) = coordinator {
                        if let Some(completion) = rec.completion.as_mut() {
                            completion(false);
                        }
                        changes.completed.push(CompletionReport {
                            key: rec.key,
                            group: Some(group),
                            finished: false,
                        });
                    }
                }
            }
        }
    }

    /// Whether every member of `group` rests in `phase` with no run.
    fn group_all(&self, group: GroupId, phase: Phase) -> bool {
        self.groups.get(&group).is_some_and(|members| {
            members.iter().all(|&m| {
                self.slot(m)
                    .is_some_and(|rec| rec.phase == phase && rec.run.is_none())
            })
        })
    }

    /// Invokes the completion of a live record and reports it.
    fn fire(
        &mut self,
        idx: u32,
        group: Option<GroupId>,
        finished: bool,
        changes: &mut TransitionChanges,
    ) {
        let Some(rec) = self.slot_mut(idx) else {
            return;
        };
        if let Some(completion) = rec.completion.as_mut() {
            completion(finished);
        }
        changes.completed.push(CompletionReport {
            key: rec.key.clone(),
            group,
            finished,
        });
    }
}
