use std::collections::BTreeSet;

use crate::{
    assignment::Assignment,
    clause::{Clause, ClauseIdx},
    data::{Lit, Var},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrailReason {
    /// Literal was decided.
    Decision,

    /// Literal was forced by a clause that became unit.
    Propagated { cls: ClauseIdx },

    /// Top-level forced literal with no clause attached. Produced by the
    /// initial pure-literal pass.
    TopLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrailElement {
    pub(crate) lit: Lit,
    pub(crate) reason: TrailReason,
}

/// The ordered record of asserted literals. Decision entries open a new
/// decision level; everything else lives at the level of the last decision
/// before it (level 0 before the first decision).
#[derive(Default)]
pub(crate) struct Trail {
    trail: Vec<TrailElement>,
    decision_positions: Vec<usize>,
    assignment: Assignment,
}

impl Trail {
    pub fn total_vars(&self) -> usize {
        self.assignment.len()
    }

    pub fn trail(&self) -> &[TrailElement] {
        &self.trail
    }

    pub fn get_lit_assignment(&self, lit: Lit) -> Option<bool> {
        self.assignment.get(lit)
    }

    /// Expands internal assignment for new max variable.
    pub fn expand(&mut self, var: Var) {
        self.assignment.expand(var)
    }

    pub fn assignment_complete(&self) -> bool {
        self.trail.len() == self.assignment.len()
    }

    pub fn current_level(&self) -> u32 {
        self.decision_positions.len() as u32
    }

    pub fn num_decisions(&self) -> usize {
        self.decision_positions.len()
    }

    pub fn is_lit_unassigned(&self, lit: Lit) -> bool {
        self.assignment.is_lit_unassigned(lit)
    }

    pub fn is_lit_satisfied(&self, lit: Lit) -> bool {
        self.assignment.is_lit_satisfied(lit)
    }

    pub fn is_lit_unsatisfied(&self, lit: Lit) -> bool {
        self.assignment.is_lit_unsatisfied(lit)
    }

    /// Decision level at which the literal's variable was assigned, if it is.
    pub fn decision_level_of(&self, lit: Lit) -> Option<u32> {
        self.assignment.decision_level_of(lit)
    }

    pub fn assign_lit(&mut self, lit: Lit, reason: TrailReason) {
        if reason == TrailReason::Decision {
            self.decision_positions.push(self.trail.len());
        }
        self.trail.push(TrailElement { lit, reason });
        self.assignment.assign_lit(lit, self.current_level());
    }

    /// The clause that forced `lit`, for trail literals with a
    /// [`TrailReason::Propagated`] entry.
    pub fn reason_cls_of(&self, lit: Lit) -> Option<ClauseIdx> {
        self.trail
            .iter()
            .rev()
            .find(|elem| elem.lit == lit)
            .and_then(|elem| match elem.reason {
                TrailReason::Propagated { cls } => Some(cls),
                TrailReason::Decision | TrailReason::TopLevel => None,
            })
    }

    /// The literal from `lits` that appears latest in the trail, if any does.
    pub fn last_asserted(&self, lits: &BTreeSet<Lit>) -> Option<Lit> {
        self.trail
            .iter()
            .rev()
            .map(|elem| elem.lit)
            .find(|lit| lits.contains(lit))
    }

    /// Remove every entry whose decision level exceeds `level`, unassigning
    /// the removed literals and dropping the abandoned decision levels.
    pub fn backtrack(&mut self, level: u32) {
        debug_assert!(level <= self.current_level());

        while self.decision_positions.len() as u32 > level {
            let pos = self
                .decision_positions
                .pop()
                .expect("non-empty by the loop condition");
            while self.trail.len() > pos {
                let elem = self.trail.pop().expect("decision position within trail");
                self.assignment.unassign_lit(elem.lit);
            }
        }

        debug_assert_eq!(
            self.num_decisions(),
            self.trail
                .iter()
                .filter(|elem| elem.reason == TrailReason::Decision)
                .count()
        );
    }

    pub fn is_clause_satisfied(&self, clause: Clause) -> bool {
        clause.iter().any(|&lit| self.is_lit_satisfied(lit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(l: i32) -> Lit {
        Lit::new(l)
    }

    #[test]
    fn levels_follow_decisions() {
        let mut trail = Trail::default();
        trail.expand(Var::new(4));

        trail.assign_lit(lit(1), TrailReason::TopLevel);
        assert_eq!(trail.current_level(), 0);
        assert_eq!(trail.decision_level_of(lit(1)), Some(0));

        trail.assign_lit(lit(2), TrailReason::Decision);
        trail.assign_lit(lit(3), TrailReason::Decision);
        assert_eq!(trail.current_level(), 2);
        assert_eq!(trail.decision_level_of(lit(2)), Some(1));
        assert_eq!(trail.decision_level_of(lit(-3)), Some(2));
        assert_eq!(trail.num_decisions(), 2);
    }

    #[test]
    fn backtrack_removes_levels_above() {
        let mut trail = Trail::default();
        trail.expand(Var::new(5));

        trail.assign_lit(lit(1), TrailReason::TopLevel);
        trail.assign_lit(lit(2), TrailReason::Decision);
        trail.assign_lit(lit(3), TrailReason::Decision);
        trail.assign_lit(lit(4), TrailReason::Decision);

        trail.backtrack(1);
        assert_eq!(trail.current_level(), 1);
        assert_eq!(trail.num_decisions(), 1);
        assert!(trail.is_lit_satisfied(lit(1)));
        assert!(trail.is_lit_satisfied(lit(2)));
        assert!(trail.is_lit_unassigned(lit(3)));
        assert!(trail.is_lit_unassigned(lit(4)));

        trail.backtrack(0);
        assert_eq!(trail.current_level(), 0);
        assert!(trail.is_lit_satisfied(lit(1)));
        assert!(trail.is_lit_unassigned(lit(2)));
    }

    #[test]
    fn last_asserted_picks_latest() {
        let mut trail = Trail::default();
        trail.expand(Var::new(3));

        trail.assign_lit(lit(1), TrailReason::Decision);
        trail.assign_lit(lit(-2), TrailReason::Decision);
        trail.assign_lit(lit(3), TrailReason::Decision);

        let set: BTreeSet<Lit> = [lit(1), lit(-2)].into_iter().collect();
        assert_eq!(trail.last_asserted(&set), Some(lit(-2)));

        let empty: BTreeSet<Lit> = BTreeSet::new();
        assert_eq!(trail.last_asserted(&empty), None);
    }
}
