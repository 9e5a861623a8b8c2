mod lit;
mod litvec;
mod varvec;

pub use lit::{Lit, Var};
pub(crate) use litvec::LitVec;
pub(crate) use varvec::VarVec;
