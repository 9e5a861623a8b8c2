/// Clauses are stored contiguously in memory.
/// The first two literals of every clause of length >= 2 are watched.
/// A literal can only appear once in a clause.
use std::{num::NonZeroU32, ops::Range};

use bitflags::bitflags;

use crate::data::Lit;

pub(crate) type Clause<'db> = &'db [Lit];
pub(crate) type ClauseMut<'db> = &'db mut [Lit];

bitflags! {
    pub(crate) struct ClauseFlags: u8 {
        /// The clause was derived by conflict analysis rather than read from the input.
        const LEARNED = 0b0000_0001;
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct ClauseIdx {
    start: u32,
    size: NonZeroU32,
}

#[derive(Debug, Clone)]
struct ClauseMeta {
    range: Range<u32>,
    flags: ClauseFlags,
}

#[derive(Clone, Default)]
pub(crate) struct ClauseDB {
    clause_data: Vec<Lit>,
    clause_meta: Vec<ClauseMeta>,
}

impl ClauseDB {
    pub fn insert_clause(&mut self, cls: Clause, flags: ClauseFlags) -> ClauseIdx {
        let start = self.clause_data.len();

        self.clause_data.extend(cls);

        let end = self.clause_data.len();
        let size = end - start;

        debug_assert!(<usize as TryInto<u32>>::try_into(end).is_ok());
        let start = start as u32;
        let end = end as u32;
        let size = size as u32;

        self.clause_meta.push(ClauseMeta {
            range: start..end,
            flags,
        });
        ClauseIdx {
            start,
            size: NonZeroU32::new(size).expect("Insertion of empty clause."),
        }
    }

    pub fn get(&self, r: ClauseIdx) -> Clause {
        debug_assert!(self.is_valid_clause_idx(r));

        let start = r.start as usize;
        let end = (r.start + r.size.get()) as usize;

        &self.clause_data[start..end]
    }

    pub fn get_mut(&mut self, r: ClauseIdx) -> ClauseMut {
        debug_assert!(self.is_valid_clause_idx(r));

        let start = r.start as usize;
        let end = (r.start + r.size.get()) as usize;

        &mut self.clause_data[start..end]
    }

    pub fn num_clauses(&self) -> usize {
        self.clause_meta.len()
    }

    fn is_valid_clause_idx(&self, r: ClauseIdx) -> bool {
        let entry = self
            .clause_meta
            .binary_search_by_key(&r.start, |meta| meta.range.start);

        match entry {
            Ok(e) => {
                let range = self.clause_meta[e].range.clone();
                range.start == r.start && range.end == r.start + r.size.get()
            }
            Err(_) => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Clause<'_>> {
        self.clause_meta
            .iter()
            .map(move |meta| &self.clause_data[meta.range.start as usize..meta.range.end as usize])
    }

    /// Iterate over the clauses that came from the input, skipping learned ones.
    pub fn iter_original(&self) -> impl Iterator<Item = Clause<'_>> {
        self.clause_meta
            .iter()
            .filter(|meta| !meta.flags.contains(ClauseFlags::LEARNED))
            .map(move |meta| &self.clause_data[meta.range.start as usize..meta.range.end as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(cls: &[i32]) -> Vec<Lit> {
        cls.iter().map(|&l| Lit::new(l)).collect()
    }

    #[test]
    fn insert_and_get() {
        let mut db = ClauseDB::default();
        let a = db.insert_clause(&lits(&[1, -2, 3]), ClauseFlags::empty());
        let b = db.insert_clause(&lits(&[-1, 2]), ClauseFlags::LEARNED);

        assert_eq!(db.get(a), &lits(&[1, -2, 3])[..]);
        assert_eq!(db.get(b), &lits(&[-1, 2])[..]);
        assert_eq!(db.num_clauses(), 2);
    }

    #[test]
    fn iter_original_skips_learned() {
        let mut db = ClauseDB::default();
        db.insert_clause(&lits(&[1, 2]), ClauseFlags::empty());
        db.insert_clause(&lits(&[-1, -2]), ClauseFlags::LEARNED);
        db.insert_clause(&lits(&[2, 3]), ClauseFlags::empty());

        assert_eq!(db.iter().count(), 3);
        assert_eq!(db.iter_original().count(), 2);
    }
}
