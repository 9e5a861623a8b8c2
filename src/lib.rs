//! A CDCL SAT solver.
//!
//! Clauses go in as DIMACS integers, the answer comes out as
//! [`Result::Sat`] with a [`Model`] or [`Result::Unsat`]. The search is
//! conflict-driven: two-watched-literal unit propagation, 1-UIP clause
//! learning, and non-chronological backjumping, with the decision literal
//! chosen by a configurable [`Heuristic`].

mod analyze;
mod assignment;
mod clause;
mod data;
pub mod dimacs;
mod heuristic;
mod log;
mod propagate;
mod trail;
mod util;
mod watch;

use std::collections::VecDeque;

use rand::{rngs::SmallRng, SeedableRng};
use tracing::debug;

use analyze::{AnalyzeResult, ConflictClause};
use clause::{ClauseDB, ClauseFlags, ClauseIdx};
use data::LitVec;
use propagate::PropagationResult;
use trail::{Trail, TrailReason};
use watch::Watch;

pub use data::{Lit, Var};
pub use dimacs::ParseError;
pub use heuristic::{Heuristic, UnknownHeuristic};

/// Counters kept during the search, readable after (or between) solves.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub learned_clauses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Undef,
    Sat,
    Unsat,
}

pub struct Solver {
    clause_db: ClauseDB,

    watches: LitVec<Vec<Watch>>,

    trail: Trail,

    /// Forced literals waiting to be asserted, with the reason to record.
    unit_queue: VecDeque<(Lit, TrailReason)>,

    /// Set by propagation when a clause goes fully falsified.
    conflict: Option<ClauseIdx>,

    /// Scratch for conflict analysis, reseeded on every conflict.
    conflict_clause: ConflictClause,

    state: State,

    /// The input contains (or conflict analysis derived) the empty clause.
    trivially_unsat: bool,

    heuristic: Heuristic,

    rng: SmallRng,

    stats: Stats,
}

/// Satisfying assignment, borrowed from the solver that found it.
pub struct Model<'a> {
    trail: &'a Trail,
}

impl<'a> Model<'a> {
    /// Truth value of a literal under the model.
    pub fn lit(&self, l: i32) -> bool {
        self.trail.is_lit_satisfied(Lit::new(l))
    }

    /// The model as DIMACS literals in ascending variable order. Variables
    /// the search never had to assign come out negative.
    pub fn as_vec(&self) -> Vec<i32> {
        (1..=self.trail.total_vars() as i32)
            .map(|v| if self.lit(v) { v } else { -v })
            .collect()
    }
}

impl std::fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Model").field(&self.as_vec()).finish()
    }
}

#[derive(Debug)]
pub struct Proof;

#[derive(Debug)]
pub enum Result<'a> {
    Sat(Model<'a>),
    Unsat(Proof),
}

impl<'a> Result<'a> {
    pub fn is_sat(&self) -> bool {
        matches!(self, Result::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Result::Unsat(_))
    }

    pub fn unwrap_sat(self) -> Model<'a> {
        match self {
            Result::Sat(model) => model,
            Result::Unsat(_) => panic!("Result is not SAT."),
        }
    }

    pub fn unwrap_unsat(self) -> Proof {
        match self {
            Result::Unsat(proof) => proof,
            Result::Sat(_) => panic!("Result is SAT."),
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::with_heuristic(Heuristic::First)
    }

    pub fn with_heuristic(heuristic: Heuristic) -> Self {
        Self::with_rng(heuristic, SmallRng::from_entropy())
    }

    /// Deterministic variant of [`Solver::with_heuristic`] for tests and
    /// reproducible runs.
    pub fn with_heuristic_seeded(heuristic: Heuristic, seed: u64) -> Self {
        Self::with_rng(heuristic, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(heuristic: Heuristic, mut rng: SmallRng) -> Self {
        let heuristic = heuristic.resolve_lucky(&mut rng);
        Self {
            clause_db: ClauseDB::default(),
            watches: LitVec::new(),
            trail: Trail::default(),
            unit_queue: VecDeque::new(),
            conflict: None,
            conflict_clause: ConflictClause::default(),
            state: State::Undef,
            trivially_unsat: false,
            heuristic,
            rng,
            stats: Stats::default(),
        }
    }

    pub fn from_dimacs(input: &str) -> std::result::Result<Solver, ParseError> {
        Self::from_dimacs_with(input, Heuristic::First)
    }

    pub fn from_dimacs_with(
        input: &str,
        heuristic: Heuristic,
    ) -> std::result::Result<Solver, ParseError> {
        Self::load_formula(input, Self::with_heuristic(heuristic))
    }

    pub fn from_dimacs_seeded(
        input: &str,
        heuristic: Heuristic,
        seed: u64,
    ) -> std::result::Result<Solver, ParseError> {
        Self::load_formula(input, Self::with_heuristic_seeded(heuristic, seed))
    }

    fn load_formula(input: &str, mut solver: Solver) -> std::result::Result<Solver, ParseError> {
        let formula = dimacs::parse(input)?;
        solver.reserve_variables(formula.num_vars);
        for clause in formula.clauses {
            solver.add_clause(clause);
        }
        Ok(solver)
    }

    /// Make room for variables 1..=`num_vars` even if some never occur in a
    /// clause. The model always covers the full header range.
    pub fn reserve_variables(&mut self, num_vars: usize) {
        if num_vars == 0 {
            return;
        }
        let max_var = Var::new(num_vars as i32);
        self.trail.expand(max_var);
        self.watches.expand(-Lit::from(max_var), Vec::new());
    }

    /// Remove duplicated literals, keeping first occurrences in order.
    /// Tautological clauses are kept as-is; they are simply always satisfied.
    fn dedup_clause(cls: &mut Vec<Lit>) {
        let mut deduped = Vec::with_capacity(cls.len());
        for &lit in cls.iter() {
            if !deduped.contains(&lit) {
                deduped.push(lit);
            }
        }
        *cls = deduped;
    }

    pub fn add_clause<I>(&mut self, cls: I)
    where
        I: IntoIterator<Item = i32>,
    {
        let mut cls: Vec<Lit> = cls.into_iter().map(Lit::new).collect();
        Self::dedup_clause(&mut cls);

        if let Some(&max_lit) = cls.iter().max_by_key(|l| l.var().get()) {
            self.trail.expand(max_lit.var());
            self.watches.expand(-Lit::from(max_lit.var()), Vec::new());
        }

        match cls.len() {
            0 => {
                self.trivially_unsat = true;
            }
            1 => {
                // Stored but never watched; the literal is forced up front.
                let idx = self.clause_db.insert_clause(&cls, ClauseFlags::empty());
                self.enqueue_forced(cls[0], TrailReason::Propagated { cls: idx });
            }
            _ => {
                let idx = self.clause_db.insert_clause(&cls, ClauseFlags::empty());
                for &lit in &cls[0..2] {
                    self.watches[lit].push(Watch { clause: idx });
                }
            }
        }
    }

    /// Some literal and its negation are both queued as top-level units.
    fn initial_units_conflict(&self) -> bool {
        self.unit_queue
            .iter()
            .any(|&(lit, _)| self.unit_queue.iter().any(|&(other, _)| other == -lit))
    }

    pub fn solve(&mut self) -> Result<'_> {
        if self.state == State::Undef {
            self.search();
        }

        match self.state {
            State::Sat => Result::Sat(self.extract_model()),
            State::Unsat => Result::Unsat(Proof),
            State::Undef => unreachable!("search ends in a terminal state"),
        }
    }

    fn search(&mut self) {
        debug!("solving with heuristic {}", self.heuristic);

        if self.trivially_unsat {
            self.state = State::Unsat;
            return;
        }

        self.enqueue_pure_literals();
        if self.initial_units_conflict() {
            debug!("contradictory top-level units");
            self.state = State::Unsat;
            return;
        }

        while self.state == State::Undef {
            self.log_state();

            match self.propagate() {
                PropagationResult::Conflict(cls) => {
                    if self.analyze_contradiction(cls) == AnalyzeResult::Unsat {
                        self.trivially_unsat = true;
                        self.state = State::Unsat;
                    }
                }
                PropagationResult::Done => {
                    debug_assert!(
                        self.watch_invariant_holds(),
                        "a quiescent clause must be satisfied or have two non-falsified watches"
                    );
                    if self.trail.assignment_complete() {
                        debug_assert!(
                            self.check_assignment(),
                            "complete assignment must satisfy the formula"
                        );
                        self.state = State::Sat;
                    } else {
                        match self.decide_literal() {
                            Some(lit) => {
                                debug!("deciding {lit}");
                                self.stats.decisions += 1;
                                self.assert_literal(lit, TrailReason::Decision);
                            }
                            None => {
                                // No unassigned literal occurs in any clause;
                                // the remaining variables are unconstrained.
                                debug_assert!(self.check_assignment());
                                self.state = State::Sat;
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "search finished: {} decisions, {} propagations, {} conflicts, {} learned",
            self.stats.decisions,
            self.stats.propagations,
            self.stats.conflicts,
            self.stats.learned_clauses
        );
    }

    fn extract_model(&self) -> Model<'_> {
        Model { trail: &self.trail }
    }

    /// Does the current assignment satisfy the entire clause database?
    fn check_assignment(&self) -> bool {
        self.clause_db
            .iter()
            .all(|clause| self.trail.is_clause_satisfied(clause))
    }

    /// Between propagation rounds every watched clause is either satisfied
    /// or has both watched slots non-falsified.
    fn watch_invariant_holds(&self) -> bool {
        self.clause_db.iter().filter(|cls| cls.len() >= 2).all(|cls| {
            self.trail.is_clause_satisfied(cls)
                || (!self.trail.is_lit_unsatisfied(cls[0])
                    && !self.trail.is_lit_unsatisfied(cls[1]))
        })
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The heuristic actually in use. For [`Heuristic::Lucky`] this is the
    /// resolved pick.
    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagation_only() {
        let mut solver = Solver::new();
        solver.add_clause([-1, 2, 3]);
        solver.add_clause([-1, -2]);
        solver.add_clause([1]);

        let model = solver.solve().unwrap_sat();
        assert!(model.lit(1));
        assert!(!model.lit(2));
        assert!(model.lit(3));
    }

    #[test]
    fn empty_clause_is_unsat() {
        let mut solver = Solver::new();
        solver.add_clause([1, 2]);
        solver.add_clause([]);

        assert!(solver.solve().is_unsat());
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let mut solver = Solver::new();
        solver.add_clause([1]);
        solver.add_clause([-1]);

        assert!(solver.solve().is_unsat());
    }

    #[test]
    fn conflicts_drive_learning() {
        let mut solver = Solver::new();
        solver.add_clause([1, 2]);
        solver.add_clause([-1, 2]);
        solver.add_clause([1, -2]);
        solver.add_clause([-1, -2]);

        assert!(solver.solve().is_unsat());
        assert!(solver.stats().conflicts >= 1);
        assert!(solver.stats().learned_clauses >= 1);
        // Learning only ever appends; the input clauses are all still there.
        assert_eq!(solver.clause_db.iter_original().count(), 4);
    }

    #[test]
    fn solve_is_idempotent() {
        let mut solver = Solver::new();
        solver.add_clause([1, 2]);

        assert!(solver.solve().is_sat());
        assert!(solver.solve().is_sat());
    }

    #[test]
    fn model_covers_header_variables() {
        let mut solver = Solver::from_dimacs("p cnf 4 1\n1 0\n").unwrap();
        let model = solver.solve().unwrap_sat();
        assert_eq!(model.as_vec().len(), 4);
        assert!(model.lit(1));
    }
}
