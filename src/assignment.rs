use crate::data::{Lit, Var, VarVec};

#[derive(Clone, Copy, Debug)]
struct AssignData {
    status: bool,
    decision_level: u32,
}

/// Variable to (value, decision level) table. The trail is the authoritative
/// assertion order; this table exists for O(1) lookups.
#[derive(Default)]
pub(crate) struct Assignment {
    assignment: VarVec<Option<AssignData>>,
}

impl Assignment {
    pub fn expand(&mut self, v: Var) {
        self.assignment.expand(v, None);
    }

    pub fn get(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.var()].map(|var_val| var_val.status == lit.is_pos())
    }

    pub fn is_lit_satisfied(&self, lit: Lit) -> bool {
        matches!(self.get(lit), Some(true))
    }

    pub fn is_lit_unsatisfied(&self, lit: Lit) -> bool {
        matches!(self.get(lit), Some(false))
    }

    pub fn is_lit_assigned(&self, lit: Lit) -> bool {
        self.assignment[lit.var()].is_some()
    }

    pub fn is_lit_unassigned(&self, lit: Lit) -> bool {
        self.assignment[lit.var()].is_none()
    }

    /// Decision level at which the literal's variable was assigned.
    pub fn decision_level_of(&self, lit: Lit) -> Option<u32> {
        self.assignment[lit.var()].map(|var_val| var_val.decision_level)
    }

    pub fn assign_lit(&mut self, lit: Lit, decision_level: u32) {
        debug_assert!(self.is_lit_unassigned(lit));

        self.assignment[lit.var()] = Some(AssignData {
            status: lit.is_pos(),
            decision_level,
        });
    }

    pub fn unassign_lit(&mut self, lit: Lit) {
        debug_assert!(self.is_lit_assigned(lit));

        self.assignment[lit.var()] = None;
    }

    pub fn len(&self) -> usize {
        self.assignment.len()
    }
}
