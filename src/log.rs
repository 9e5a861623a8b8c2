use tracing::debug;

use crate::{
    data::Lit,
    trail::{Trail, TrailReason},
    Solver,
};

const RED: &str = "\u{1b}[31m";
const GREEN: &str = "\u{1b}[32m";
const END: &str = "\u{1b}[0m";

impl Solver {
    /// Dump every clause colored by the current assignment. Debug builds only.
    pub(crate) fn log_state(&self) {
        #[cfg(debug_assertions)]
        for cls in self.clause_db.iter() {
            debug!("{}", self.trail.fmt_clause(cls));
        }
    }
}

impl Trail {
    pub(crate) fn fmt_lit(&self, lit: Lit) -> String {
        match self.get_lit_assignment(lit) {
            Some(true) => format!("{GREEN}{lit}{END}"),
            Some(false) => format!("{RED}{lit}{END}"),
            None => format!("{lit}"),
        }
    }

    pub(crate) fn fmt_clause(&self, clause: &[Lit]) -> String {
        clause
            .iter()
            .map(|&lit| self.fmt_lit(lit))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn fmt_trail(&self) -> String {
        let elems = self
            .trail()
            .iter()
            .map(|elem| {
                let lit = elem.lit;
                match elem.reason {
                    TrailReason::Decision => format!("{lit}D"),
                    TrailReason::Propagated { .. } => format!("{lit}P"),
                    TrailReason::TopLevel => format!("{lit}T"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("[{elems}]")
    }
}
