//! ACBP Core - Model types for bitmask-and-category policies
//!
//! This crate provides the fundamental abstractions for ACBP:
//! - Mask helpers over 64-bit flag words
//! - Category tuples and their canonical order
//! - Predicate trees and rule declarations
//! - Validated model editions

pub mod error;
pub mod mask;
pub mod model;
pub mod predicate;
pub mod rule;
pub mod tuple;

pub use error::{AcbpError, CompileError, EnumerationBudgetExceeded, Result, TupleError};
pub use mask::{Mask, MAX_WIDTH};
pub use model::{
    BitDeclaration, BitFlag, CategoryDeclaration, CategoryDimension, Model, ModelDeclaration,
    RuleDeclaration, RuleDef,
};
pub use predicate::Predicate;
pub use rule::{Rule, RuleKind};
pub use tuple::{CategoryTuple, TupleOdometer};
