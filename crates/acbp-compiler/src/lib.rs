//! Rule compilation for ACBP models.
//!
//! This crate turns a validated [`Model`](acbp_core::Model) into an
//! executable validity predicate:
//! - [`CompiledPredicate`] resolves predicate trees into closures over
//!   category tuples
//! - [`link`] compiles each rule into a tagged [`Clause`] and conjoins them
//!   into a [`ValidityFunction`]
//! - [`explain`] reports a verdict per clause for one input

mod explain;
mod linker;
mod predicate;
mod types;

pub use explain::{explain, Explanation, RuleVerdict, Verdict};
pub use linker::{link, Clause, ClauseShape, ValidityFunction};
pub use predicate::CompiledPredicate;
pub use types::{ClauseTest, TupleTest};
