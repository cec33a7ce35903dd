//! Valid-mask projection.
//!
//! M is always π_mask(D). The bit-only relaxation is only used to report
//! masks it accepts that the decision space does not contain.

use acbp_compiler::ValidityFunction;
use acbp_core::Mask;

use crate::analyze::ComplexityReport;
use crate::enumerate::{DecisionRow, DecisionSpace};

/// Distinct masks of a decision space, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidMaskSet {
    masks: Vec<Mask>,
}

impl ValidMaskSet {
    pub fn as_slice(&self) -> &[Mask] {
        &self.masks
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn contains(&self, mask: Mask) -> bool {
        self.masks.binary_search(&mask).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Mask> + '_ {
        self.masks.iter().copied()
    }
}

/// Projects a materialized decision space onto its masks.
pub fn project(space: &DecisionSpace) -> ValidMaskSet {
    project_rows(space.iter())
}

/// Projects rows given in canonical order, such as a lazy enumeration.
pub fn project_rows<'a>(rows: impl IntoIterator<Item = &'a DecisionRow>) -> ValidMaskSet {
    let mut masks: Vec<Mask> = Vec::new();
    for row in rows {
        if masks.last() != Some(&row.mask) {
            masks.push(row.mask);
        }
    }
    masks.sort_unstable();
    masks.dedup();
    ValidMaskSet { masks }
}

/// Candidate masks accepted by the bit-only relaxation, ascending.
///
/// Requires the guardrail to have passed; the candidate set has
/// `2^B_eff` entries.
pub fn bit_valid_masks(function: &ValidityFunction, report: &ComplexityReport) -> Vec<Mask> {
    report
        .plan
        .candidates()
        .into_iter()
        .filter(|&m| function.is_valid_mask(m))
        .collect()
}

/// Bit-valid masks with no row in the decision space.
pub fn dead_masks(bit_valid: &[Mask], projected: &ValidMaskSet) -> Vec<Mask> {
    bit_valid
        .iter()
        .copied()
        .filter(|&m| !projected.contains(m))
        .collect()
}
