/// Decision heuristics. All of them are recomputed from the clause database
/// on demand; none of them keeps cross-decision state. A heuristic returns
/// `None` when no unassigned literal occurs in any clause, which the driver
/// reads as "the remaining variables are unconstrained".
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::{
    data::{Lit, LitVec, Var, VarVec},
    trail::TrailReason,
    Solver,
};

/// Exponent of the clause-count weight in the MOMS score,
/// `(p + n) * 2^k + p * n`. Freeman's thesis suggests 10.
const MOMS_K: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// First unassigned literal in clause order.
    First,
    /// First unassigned variable, polarity by coin flip.
    YesNo,
    /// Uniformly random unassigned occurrence, positive polarity.
    Random,
    /// Dynamic largest individual sum: most frequent unassigned literal.
    Dlis,
    Rdlis,
    /// Dynamic largest combined sum: variable with the most occurrences
    /// over both polarities.
    Dlcs,
    Rdlcs,
    /// Jeroslow-Wang: occurrences weighted by 2^-len, short clauses count more.
    Jw,
    Rjw,
    /// Maximum occurrences in minimum-length clauses.
    Moms,
    Rmoms,
    /// Pick one of the other heuristics at random, once, at construction.
    Lucky,
}

impl Heuristic {
    /// Resolve [`Heuristic::Lucky`] into a concrete pick; any other variant
    /// is returned unchanged.
    pub(crate) fn resolve_lucky(self, rng: &mut impl Rng) -> Heuristic {
        use Heuristic::*;

        if self != Lucky {
            return self;
        }
        const CHOICES: [Heuristic; 10] =
            [First, Random, Dlis, Rdlis, Dlcs, Rdlcs, Jw, Rjw, Moms, Rmoms];
        CHOICES[rng.gen_range(0..CHOICES.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown heuristic `{0}`")]
pub struct UnknownHeuristic(String);

impl FromStr for Heuristic {
    type Err = UnknownHeuristic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "without" | "first" => Heuristic::First,
            "yesno" => Heuristic::YesNo,
            "random" => Heuristic::Random,
            "dlis" => Heuristic::Dlis,
            "rdlis" => Heuristic::Rdlis,
            "dlcs" => Heuristic::Dlcs,
            "rdlcs" => Heuristic::Rdlcs,
            "jw" => Heuristic::Jw,
            "rjw" => Heuristic::Rjw,
            "moms" => Heuristic::Moms,
            "rmoms" => Heuristic::Rmoms,
            "lucky" => Heuristic::Lucky,
            other => return Err(UnknownHeuristic(other.to_string())),
        })
    }
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Heuristic::First => "first",
            Heuristic::YesNo => "yesno",
            Heuristic::Random => "random",
            Heuristic::Dlis => "dlis",
            Heuristic::Rdlis => "rdlis",
            Heuristic::Dlcs => "dlcs",
            Heuristic::Rdlcs => "rdlcs",
            Heuristic::Jw => "jw",
            Heuristic::Rjw => "rjw",
            Heuristic::Moms => "moms",
            Heuristic::Rmoms => "rmoms",
            Heuristic::Lucky => "lucky",
        };
        name.fmt(f)
    }
}

/// What polarities of a variable occur in the formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Unseen,
    OnlyPos,
    OnlyNeg,
    Both,
}

impl Polarity {
    fn observe(self, lit: Lit) -> Polarity {
        match (self, lit.is_pos()) {
            (Polarity::Unseen, true) | (Polarity::OnlyPos, true) => Polarity::OnlyPos,
            (Polarity::Unseen, false) | (Polarity::OnlyNeg, false) => Polarity::OnlyNeg,
            _ => Polarity::Both,
        }
    }
}

impl Solver {
    /// Pick the next decision literal with the configured heuristic.
    pub(crate) fn decide_literal(&mut self) -> Option<Lit> {
        match self.heuristic {
            Heuristic::First => self.select_first(),
            Heuristic::YesNo => self.select_yes_no(),
            Heuristic::Random => self.select_random(),
            Heuristic::Dlis => self.select_dlis(false),
            Heuristic::Rdlis => self.select_dlis(true),
            Heuristic::Dlcs => self.select_dlcs(false),
            Heuristic::Rdlcs => self.select_dlcs(true),
            Heuristic::Jw => self.select_jw(false),
            Heuristic::Rjw => self.select_jw(true),
            Heuristic::Moms => self.select_moms(false),
            Heuristic::Rmoms => self.select_moms(true),
            Heuristic::Lucky => unreachable!("lucky is resolved at construction"),
        }
    }

    /// One-shot pass before search: a variable occurring with only one
    /// polarity can be asserted with that polarity without losing any model.
    pub(crate) fn enqueue_pure_literals(&mut self) {
        let num_vars = self.trail.total_vars();
        if num_vars == 0 {
            return;
        }

        let mut seen: VarVec<Polarity> = VarVec::new();
        seen.expand(Var::new(num_vars as i32), Polarity::Unseen);
        for cls in self.clause_db.iter_original() {
            for &lit in cls {
                seen[lit.var()] = seen[lit.var()].observe(lit);
            }
        }

        let pure: Vec<Lit> = seen
            .iter_with_var()
            .filter_map(|(var, polarity)| match polarity {
                Polarity::OnlyPos => Some(Lit::from(var)),
                Polarity::OnlyNeg => Some(-Lit::from(var)),
                Polarity::Unseen | Polarity::Both => None,
            })
            .collect();

        for lit in pure {
            debug!("pure literal {lit}");
            self.enqueue_forced(lit, TrailReason::TopLevel);
        }
    }

    fn select_first(&self) -> Option<Lit> {
        self.clause_db
            .iter()
            .flat_map(|cls| cls.iter().copied())
            .find(|&lit| self.trail.is_lit_unassigned(lit))
    }

    fn select_yes_no(&mut self) -> Option<Lit> {
        let var = self.select_first()?.var();
        let pos = Lit::from(var);
        Some(if self.rng.gen() { pos } else { -pos })
    }

    fn select_random(&mut self) -> Option<Lit> {
        let candidates: Vec<Lit> = self
            .clause_db
            .iter()
            .flat_map(|cls| cls.iter().copied())
            .filter(|&lit| self.trail.is_lit_unassigned(lit))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let lit = candidates[self.rng.gen_range(0..candidates.len())];
        // The sampled occurrence only picks the variable; the decision is
        // its positive literal.
        Some(Lit::from(lit.var()))
    }

    fn select_dlis(&mut self, randomized: bool) -> Option<Lit> {
        let num_vars = self.trail.total_vars();
        if num_vars == 0 {
            return None;
        }

        let mut counts: LitVec<u32> = LitVec::new();
        counts.expand(Lit::new(-(num_vars as i32)), 0);
        for cls in self.clause_db.iter() {
            for &lit in cls {
                if self.trail.is_lit_unassigned(lit) {
                    counts[lit] += 1;
                }
            }
        }

        let scored = (1..=num_vars as i32)
            .flat_map(|v| [Lit::new(v), Lit::new(-v)])
            .filter_map(|lit| {
                let count = counts[lit];
                (count > 0).then_some((lit, count))
            });
        self.pick_max(scored, randomized)
    }

    fn select_dlcs(&mut self, randomized: bool) -> Option<Lit> {
        let counts = self.polarity_counts(usize::MAX)?;

        let scored = counts
            .iter_with_var()
            .filter_map(|(var, &(pos, neg))| {
                let combined = pos + neg;
                (combined > 0).then_some((Lit::from(var), combined))
            })
            .collect::<Vec<_>>();
        self.pick_max(scored.into_iter(), randomized)
    }

    fn select_jw(&mut self, randomized: bool) -> Option<Lit> {
        let num_vars = self.trail.total_vars();
        if num_vars == 0 {
            return None;
        }

        let mut scores: LitVec<f64> = LitVec::new();
        scores.expand(Lit::new(-(num_vars as i32)), 0.0);
        for cls in self.clause_db.iter() {
            let weight = 2.0_f64.powi(-(cls.len() as i32));
            for &lit in cls {
                if self.trail.is_lit_unassigned(lit) {
                    scores[lit] += weight;
                }
            }
        }

        let scored = (1..=num_vars as i32)
            .flat_map(|v| [Lit::new(v), Lit::new(-v)])
            .filter_map(|lit| {
                let score = scores[lit];
                (score > 0.0).then_some((lit, score))
            });
        self.pick_max(scored, randomized)
    }

    fn select_moms(&mut self, randomized: bool) -> Option<Lit> {
        let num_clauses = self.clause_db.num_clauses();
        if num_clauses == 0 {
            return None;
        }

        let total_len: usize = self.clause_db.iter().map(<[Lit]>::len).sum();
        let mean_len = total_len / num_clauses;
        let cutoff = std::cmp::max(mean_len.saturating_sub(1), 1);

        let counts = self.polarity_counts(cutoff)?;
        let scored = counts
            .iter_with_var()
            .filter_map(|(var, &(pos, neg))| {
                let score =
                    i64::from(pos + neg) * (1_i64 << MOMS_K) + i64::from(pos) * i64::from(neg);
                (score > 0).then_some((Lit::from(var), score))
            })
            .collect::<Vec<_>>();

        match self.pick_max(scored.into_iter(), randomized) {
            Some(lit) => Some(lit),
            // Nothing unassigned occurs in a short clause.
            None => self.select_first(),
        }
    }

    /// Per-variable (positive, negative) occurrence counts of unassigned
    /// variables, restricted to clauses of length at most `max_len`.
    fn polarity_counts(&self, max_len: usize) -> Option<VarVec<(u32, u32)>> {
        let num_vars = self.trail.total_vars();
        if num_vars == 0 {
            return None;
        }

        let mut counts: VarVec<(u32, u32)> = VarVec::new();
        counts.expand(Var::new(num_vars as i32), (0, 0));
        for cls in self.clause_db.iter() {
            if cls.len() > max_len {
                continue;
            }
            for &lit in cls {
                if self.trail.is_lit_unassigned(lit) {
                    let entry = &mut counts[lit.var()];
                    if lit.is_pos() {
                        entry.0 += 1;
                    } else {
                        entry.1 += 1;
                    }
                }
            }
        }
        Some(counts)
    }

    /// Highest-scoring literal. The deterministic variants keep the first
    /// candidate in iteration order; the randomized ones pick uniformly
    /// among the literals tied for the maximum.
    fn pick_max<S: PartialOrd + Copy>(
        &mut self,
        scored: impl Iterator<Item = (Lit, S)>,
        randomized: bool,
    ) -> Option<Lit> {
        let mut best: Option<(Lit, S)> = None;
        let mut tied: Vec<Lit> = Vec::new();

        for (lit, score) in scored {
            match best {
                Some((_, best_score)) if score < best_score => {}
                Some((_, best_score)) if score == best_score => tied.push(lit),
                _ => {
                    best = Some((lit, score));
                    tied.clear();
                    tied.push(lit);
                }
            }
        }

        let (best_lit, _) = best?;
        if randomized {
            Some(tied[self.rng.gen_range(0..tied.len())])
        } else {
            Some(best_lit)
        }
    }
}
