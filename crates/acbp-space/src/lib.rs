//! Decision-space engine for ACBP.
//!
//! Given a linked [`ValidityFunction`](acbp_compiler::ValidityFunction),
//! this crate bounds, enumerates and checks its decision space:
//!
//! - [`analyze`] derives B_eff, n_eff and the guardrail decision
//! - [`Enumerator`] produces D in canonical order, serially or sharded
//! - [`project`] derives M = π_mask(D)
//! - [`present_only`] restricts D to observed category tuples
//! - [`Verification`] checks materialized D and M
//! - [`estimate`] and [`audit`] report on sizes and observed data

pub mod analyze;
pub mod audit;
pub mod enumerate;
pub mod estimate;
pub mod present;
pub mod project;
pub mod reduction;
pub mod verify;

pub use analyze::{analyze, ComplexityReport};
pub use audit::{audit, InvalidObservation, InvalidReason, ObservationAudit};
pub use enumerate::{DecisionRow, DecisionRows, DecisionSpace, Enumerator};
pub use estimate::{estimate, FlagPrevalence, ForbidFraction, SizingEstimate};
pub use present::{present_only, present_only_tuples, PresentOnly, PresentOnlyWarning};
pub use project::{bit_valid_masks, dead_masks, project, project_rows, ValidMaskSet};
pub use reduction::ReductionPlan;
pub use verify::{CheckName, CheckResult, CheckStatus, Verification, VerificationReport};
