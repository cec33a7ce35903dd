//! ACBP - Algebraic Categorical Bitmask Policies
//!
//! Declare flags, finite categories and rules; get a validity function, an
//! enumerated decision space and verification over it.
//!
//! # Example
//!
//! ```rust
//! use acbp::prelude::*;
//!
//! let decl = ModelDeclaration::new("clinic")
//!     .with_flags(["booked", "checked_in"])
//!     .with_category("modality", ["InPerson", "Virtual"])
//!     .with_rule(Rule::bit_implies("checked_in", "booked"));
//!
//! let policy = CompiledPolicy::compile(decl, EngineConfig::default()).unwrap();
//! assert!(!policy.is_valid_mask(0b10));
//!
//! let masks = policy.valid_masks().unwrap();
//! assert_eq!(masks.as_slice(), &[0b00, 0b01, 0b11]);
//! ```

mod error;
mod policy;

pub use error::PolicyError;
pub use policy::{CompiledPolicy, PolicyArtifacts};

// Model types
pub use acbp_core::{
    mask, AcbpError, BitFlag, CategoryDimension, CategoryTuple, CompileError,
    EnumerationBudgetExceeded, Mask, Model, ModelDeclaration, Predicate, Rule, RuleKind,
    TupleError,
};

// Configuration and model documents
pub use acbp_config::{BitReduction, ConfigError, EngineConfig, EnumerationThreads, ModelSource};

// Compiled rules
pub use acbp_compiler::{Clause, ClauseShape, Explanation, RuleVerdict, ValidityFunction, Verdict};

// Decision space
pub use acbp_space::{
    CheckName, CheckResult, CheckStatus, ComplexityReport, DecisionRow, DecisionSpace, Enumerator,
    ObservationAudit, PresentOnly, PresentOnlyWarning, SizingEstimate, ValidMaskSet,
    VerificationReport,
};

pub mod prelude {
    pub use super::{CompiledPolicy, PolicyArtifacts};
    pub use super::{EngineConfig, ModelDeclaration, ModelSource, Predicate, Rule};
    pub use super::{CategoryTuple, DecisionRow, Mask, Verdict};
}
