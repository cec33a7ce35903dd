//! Error types for ACBP

use thiserror::Error;

/// Rejection of a model edition at load or compile time.
///
/// A compile error aborts the whole edition; nothing is partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("bit width {width} exceeds the 64-bit mask")]
    WidthTooLarge { width: u32 },

    #[error("bit '{name}' has index {index}, outside width {width}")]
    BitIndexOutOfRange { name: String, index: u32, width: u32 },

    #[error("bit '{name}' is declared more than once")]
    DuplicateBit { name: String },

    #[error("bit index {index} is used by both '{first}' and '{second}'")]
    DuplicateBitIndex {
        index: u8,
        first: String,
        second: String,
    },

    #[error("category '{name}' is declared more than once")]
    DuplicateCategory { name: String },

    #[error("category '{category}' has an empty domain")]
    EmptyDomain { category: String },

    #[error("category '{category}' lists value '{value}' more than once")]
    DuplicateValue { category: String, value: String },

    #[error("rule '{rule}' references undeclared bit '{bit}'")]
    UnknownBit { rule: String, bit: String },

    #[error("rule '{rule}' needs at least one bit in '{field}'")]
    EmptyBitSet { rule: String, field: &'static str },

    #[error("rule '{rule}' pairs bit '{bit}' with itself")]
    SelfPairedBit { rule: String, bit: String },

    #[error("rule id '{id}' is used more than once")]
    DuplicateRuleId { id: String },

    #[error("predicate references undeclared category '{field}'")]
    UnknownField { field: String },

    #[error("value '{value}' is not in the domain of category '{field}'")]
    UnknownValue { field: String, value: String },

    #[error("membership test on '{field}' has an empty value set")]
    EmptyValueSet { field: String },
}

/// Failure to resolve externally supplied category values against a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    #[error("expected {expected} category values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("value '{value}' is not in the domain of category '{dimension}'")]
    UnknownValue { dimension: String, value: String },

    #[error("value index {index} is out of range for category '{dimension}'")]
    IndexOutOfRange { dimension: String, index: u32 },
}

/// Deliberate refusal to enumerate a decision space that is too wide.
///
/// This is not a crash: the validity function remains usable as a
/// standalone validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "enumeration refused: effective width {effective_bits} bits (declared {declared_bits}) exceeds limit of {limit_bits} bits"
)]
pub struct EnumerationBudgetExceeded {
    pub declared_bits: u32,
    pub effective_bits: u32,
    pub limit_bits: u32,
}

/// Main error type for ACBP operations
#[derive(Debug, Error)]
pub enum AcbpError {
    /// Model or predicate rejected
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Category values could not be resolved
    #[error("Tuple error: {0}")]
    Tuple(#[from] TupleError),

    /// Guardrail refused enumeration
    #[error(transparent)]
    Budget(#[from] EnumerationBudgetExceeded),

    /// Error in engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ACBP operations
pub type Result<T> = std::result::Result<T, AcbpError>;
