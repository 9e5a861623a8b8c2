/// Conflict analysis: resolve the conflicting clause against the reasons of
/// its literals, newest first, until only one literal of the current decision
/// level remains (the first unique implication point). The resulting clause
/// is learned and determines the backjump level.
use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    clause::{ClauseFlags, ClauseIdx},
    data::Lit,
    trail::TrailReason,
    watch::Watch,
    Solver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnalyzeResult {
    Unsat,
    Backjumped,
}

/// The resolvent under construction, kept in two mirrored forms: the clause
/// itself and its pointwise negation. The negated form is what the trail
/// queries work on, since every literal of the resolvent is falsified.
#[derive(Default)]
pub(crate) struct ConflictClause {
    clause: BTreeSet<Lit>,
    negated: BTreeSet<Lit>,
}

impl ConflictClause {
    fn seed(&mut self, cls: &[Lit]) {
        self.clause.clear();
        self.negated.clear();
        for &lit in cls {
            self.insert(lit);
        }
    }

    fn insert(&mut self, lit: Lit) {
        self.clause.insert(lit);
        self.negated.insert(-lit);
        debug_assert_eq!(self.clause.len(), self.negated.len());
    }

    fn remove(&mut self, lit: Lit) {
        self.clause.remove(&lit);
        self.negated.remove(&-lit);
        debug_assert_eq!(self.clause.len(), self.negated.len());
    }
}

impl Solver {
    /// Entry point after [`Solver::propagate`] reported a conflict.
    pub(crate) fn analyze_contradiction(&mut self, conflicting: ClauseIdx) -> AnalyzeResult {
        self.stats.conflicts += 1;

        let seed = self.clause_db.get(conflicting).to_vec();
        debug_assert!(seed.iter().all(|&lit| self.trail.is_lit_unsatisfied(lit)));
        debug!(
            "analyzing conflict {seed:?}, trail {}",
            self.trail.fmt_trail()
        );
        self.conflict_clause.seed(&seed);

        if self.trail.current_level() == 0 {
            // No decision to undo. Resolving everything away derives the
            // empty clause, so the formula is unsatisfiable.
            self.analyze_to_empty();
            return AnalyzeResult::Unsat;
        }

        self.analyze_to_uip();
        self.learn_and_backjump();
        AnalyzeResult::Backjumped
    }

    /// The resolvent is at the first UIP iff its newest literal is the only
    /// one on its decision level.
    fn is_at_uip(&self) -> bool {
        match self.trail.last_asserted(&self.conflict_clause.negated) {
            Some(last) => {
                let last_level = self
                    .trail
                    .decision_level_of(last)
                    .expect("trail literal is assigned");
                self.conflict_clause
                    .negated
                    .iter()
                    .filter(|&&lit| self.trail.decision_level_of(lit) == Some(last_level))
                    .count()
                    == 1
            }
            None => true,
        }
    }

    /// Resolve the conflict clause with the reason of `lit` (a trail literal
    /// whose negation is in the conflict clause). A no-op for decisions.
    fn resolve_with_reason_of(&mut self, lit: Lit) {
        let Some(reason_idx) = self.trail.reason_cls_of(lit) else {
            return;
        };
        let reason = self.clause_db.get(reason_idx).to_vec();
        debug!("resolving on {lit} with reason {reason:?}");

        self.conflict_clause.remove(-lit);
        for other in reason {
            if other != lit {
                self.conflict_clause.insert(other);
            }
        }
    }

    fn analyze_to_uip(&mut self) {
        while !self.is_at_uip() {
            let last = self
                .trail
                .last_asserted(&self.conflict_clause.negated)
                .expect("a conflict seen above level 0 involves trail literals");
            self.resolve_with_reason_of(last);
        }
    }

    /// At decision level 0 every conflict literal was forced, so repeated
    /// resolution must end in the empty clause.
    fn analyze_to_empty(&mut self) {
        while let Some(last) = self.trail.last_asserted(&self.conflict_clause.negated) {
            debug_assert!(
                self.trail.reason_cls_of(last).is_some(),
                "level-0 conflicts only involve clause-forced literals"
            );
            self.resolve_with_reason_of(last);
        }
        debug_assert!(self.conflict_clause.clause.is_empty());
    }

    /// Everything in the conflict clause except the asserting literal lives
    /// at or below the returned level.
    fn backjump_level(&self, asserting_lit: Lit) -> u32 {
        self.conflict_clause
            .clause
            .iter()
            .filter(|&&lit| lit != asserting_lit)
            .map(|&lit| {
                self.trail
                    .decision_level_of(lit)
                    .expect("conflict literals are falsified on the trail")
            })
            .max()
            .unwrap_or(0)
    }

    /// Store the 1-UIP clause, jump back, and immediately assert the flipped
    /// UIP with the learned clause as its reason.
    fn learn_and_backjump(&mut self) {
        let uip = self
            .trail
            .last_asserted(&self.conflict_clause.negated)
            .expect("1-UIP analysis leaves the UIP literal");
        let asserting_lit = -uip;
        debug_assert_eq!(
            self.trail.decision_level_of(uip),
            Some(self.trail.current_level())
        );

        let backjump_level = self.backjump_level(asserting_lit);

        // Order the literals so the installed watches are exactly the two
        // newest ones: the asserting literal in slot 0 and a literal of the
        // backjump level in slot 1.
        let mut learned: Vec<Lit> = Vec::with_capacity(self.conflict_clause.clause.len());
        learned.push(asserting_lit);
        learned.extend(
            self.conflict_clause
                .clause
                .iter()
                .copied()
                .filter(|&lit| lit != asserting_lit),
        );
        if learned.len() >= 2 {
            let slot1 = learned[1..]
                .iter()
                .position(|&lit| self.trail.decision_level_of(lit) == Some(backjump_level))
                .expect("some learned literal lives at the backjump level")
                + 1;
            learned.swap(1, slot1);
        }

        debug!("learned {learned:?}, backjumping to level {backjump_level}");

        self.trail.backtrack(backjump_level);

        let learned_idx = self.clause_db.insert_clause(&learned, ClauseFlags::LEARNED);
        self.stats.learned_clauses += 1;
        if learned.len() >= 2 {
            for &lit in &learned[0..2] {
                self.watches[lit].push(Watch {
                    clause: learned_idx,
                });
            }
        }

        self.stats.propagations += 1;
        self.assert_literal(
            asserting_lit,
            TrailReason::Propagated { cls: learned_idx },
        );
    }
}
