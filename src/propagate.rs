/// Unit propagation over the two-watched-literal scheme.
///
/// Forced literals wait in a FIFO queue together with the clause that forced
/// them and are asserted one at a time. Asserting a literal walks the watch
/// list of its negation: every clause watching the newly falsified literal
/// either turns out satisfied, relocates its watch to a non-falsified
/// literal, goes unit, or raises a conflict.
use tracing::debug;

use crate::{clause::ClauseIdx, data::Lit, trail::TrailReason, watch::Watch, Solver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropagationResult {
    Conflict(ClauseIdx),
    Done,
}

impl Solver {
    /// Queue `lit` to be asserted as a forced literal. Literals already
    /// waiting in the queue are not queued twice.
    pub(crate) fn enqueue_forced(&mut self, lit: Lit, reason: TrailReason) {
        debug_assert!(!matches!(reason, TrailReason::Decision));

        if !self.unit_queue.iter().any(|&(queued, _)| queued == lit) {
            self.unit_queue.push_back((lit, reason));
        }
    }

    /// Append `lit` to the trail and notify the clauses watching its negation.
    pub(crate) fn assert_literal(&mut self, lit: Lit, reason: TrailReason) {
        self.trail.assign_lit(lit, reason);
        self.notify_watches(-lit);
    }

    /// Drain the unit queue until it is empty or a conflict is raised.
    pub(crate) fn propagate(&mut self) -> PropagationResult {
        loop {
            if let Some(conflicting_cls) = self.conflict.take() {
                // Whatever is still queued was forced under assignments that
                // the upcoming backjump removes.
                self.unit_queue.clear();
                debug!(
                    "conflict in clause {:?}",
                    self.clause_db.get(conflicting_cls)
                );
                return PropagationResult::Conflict(conflicting_cls);
            }

            match self.unit_queue.pop_front() {
                Some((lit, reason)) => {
                    debug_assert!(self.trail.is_lit_unassigned(lit));
                    self.stats.propagations += 1;
                    self.assert_literal(lit, reason);
                }
                None => return PropagationResult::Done,
            }
        }
    }

    /// `falsified` just became false on the trail; re-examine every clause
    /// watching it.
    fn notify_watches(&mut self, falsified: Lit) {
        let (watch_list, mut other_watches) = self.watches.remaining(falsified);

        watch_list.retain(|watch| {
            // Once a conflict is found the remaining watches stay untouched.
            if self.conflict.is_some() {
                return true;
            }

            let cls = self.clause_db.get_mut(watch.clause);

            // Make slot 0 the probe position: the watched literal that is
            // not the falsified one.
            if cls[0] == falsified {
                cls.swap(0, 1);
            }
            debug_assert_eq!(cls[1], falsified);

            // The other watched literal already satisfies the clause.
            if self.trail.is_lit_satisfied(cls[0]) {
                return true;
            }

            // Look for a non-falsified literal to take over the watch.
            for candidate_idx in 2..cls.len() {
                if !self.trail.is_lit_unsatisfied(cls[candidate_idx]) {
                    cls.swap(1, candidate_idx);
                    other_watches[cls[1]].push(Watch {
                        clause: watch.clause,
                    });
                    return false;
                }
            }

            // Every literal except the probe is falsified. The clause is
            // unit on slot 0, or a conflict if slot 0 is falsified too.
            if self.trail.is_lit_unsatisfied(cls[0]) {
                self.conflict = Some(watch.clause);
            } else {
                let unit_lit = cls[0];
                if !self.unit_queue.iter().any(|&(queued, _)| queued == unit_lit) {
                    self.unit_queue.push_back((
                        unit_lit,
                        TrailReason::Propagated { cls: watch.clause },
                    ));
                }
            }
            true
        });
    }
}
