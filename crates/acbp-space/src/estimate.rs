//! Informational sizing estimate.
//!
//! Estimates decision-space size from the bit-only valid masks under a
//! uniform, independent-category assumption. Nothing here affects
//! enumeration or verification.

use acbp_compiler::{CompiledPredicate, ValidityFunction};
use acbp_core::mask::contains_all;
use acbp_core::{Mask, Model, Predicate, Rule};
use tracing::debug;

/// Prevalence of one flag among the bit-valid masks.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagPrevalence {
    pub name: String,
    pub fraction: f64,
}

/// Estimated share of rows removed by one bit-forbid rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ForbidFraction {
    pub rule_id: String,
    /// Share of bit-valid masks with every forbidden bit set.
    pub bit_fraction: f64,
    /// Share of the category space matching the predicate.
    pub category_fraction: f64,
}

impl ForbidFraction {
    pub fn fraction(&self) -> f64 {
        self.bit_fraction * self.category_fraction
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingEstimate {
    pub valid_masks: u64,
    pub category_count: u128,
    /// |V| × |C|.
    pub theoretical_max: u128,
    pub flags: Vec<FlagPrevalence>,
    pub forbids: Vec<ForbidFraction>,
    /// theoretical_max × Π(1 − f) over the bit-forbid rules.
    pub estimated_rows: f64,
    pub notes: Vec<String>,
}

/// Builds the estimate from the bit-only valid masks `bit_valid`.
pub fn estimate(
    function: &ValidityFunction,
    bit_valid: &[Mask],
    scan_limit: u64,
) -> SizingEstimate {
    let model = function.model();
    let total = bit_valid.len() as f64;
    let share = |required: Mask| {
        if bit_valid.is_empty() {
            0.0
        } else {
            bit_valid.iter().filter(|&&m| contains_all(m, required)).count() as f64 / total
        }
    };

    let flags = model
        .bits()
        .iter()
        .map(|b| FlagPrevalence {
            name: b.name.clone(),
            fraction: share(b.mask()),
        })
        .collect();

    let mut forbids = Vec::new();
    let mut notes = Vec::new();
    for def in model.rules() {
        match &def.rule {
            Rule::BitForbid {
                forbid_when,
                predicate,
            } => {
                let Ok(forbid) = model.resolve_bits(&def.id, forbid_when) else {
                    continue;
                };
                forbids.push(ForbidFraction {
                    rule_id: def.id.clone(),
                    bit_fraction: share(forbid),
                    category_fraction: category_fraction(model, predicate, scan_limit),
                });
            }
            Rule::CatForbid { .. } | Rule::Implies { .. } => notes.push(format!(
                "{} excluded from the estimate ({} rule)",
                def.id,
                def.rule.kind()
            )),
            _ => {}
        }
    }

    let category_count = model.category_count();
    let theoretical_max = (bit_valid.len() as u128).saturating_mul(category_count);
    let estimated_rows = forbids
        .iter()
        .fold(theoretical_max as f64, |acc, f| acc * (1.0 - f.fraction()));

    debug!(
        event = "sizing_estimate",
        valid_masks = bit_valid.len(),
        theoretical_max = %theoretical_max,
        estimated_rows,
    );
    SizingEstimate {
        valid_masks: bit_valid.len() as u64,
        category_count,
        theoretical_max,
        flags,
        forbids,
        estimated_rows,
        notes,
    }
}

/// Share of the category space matching `predicate`.
///
/// Exact by scan within `scan_limit`; otherwise the product of per-field
/// value shares of top-level `Eq`/`In` conjuncts, other terms counting as 1.
fn category_fraction(model: &Model, predicate: &Predicate, scan_limit: u64) -> f64 {
    let count = model.category_count();
    if count == 0 {
        return 0.0;
    }
    if count <= scan_limit as u128 {
        if let Ok(compiled) = CompiledPredicate::compile(model, predicate) {
            if let Some(value) = compiled.constant() {
                return if value { 1.0 } else { 0.0 };
            }
            let hits = model.tuples().filter(|t| compiled.eval(t)).count();
            return hits as f64 / count as f64;
        }
    }

    let conjuncts = match predicate {
        Predicate::All(terms) => terms.as_slice(),
        other => std::slice::from_ref(other),
    };
    conjuncts
        .iter()
        .map(|term| match term {
            Predicate::Eq { field, .. } => field_share(model, field, 1),
            Predicate::In { field, values } => field_share(model, field, values.len()),
            _ => 1.0,
        })
        .product()
}

fn field_share(model: &Model, field: &str, values: usize) -> f64 {
    match model.category(field) {
        Some((_, dim)) if !dim.is_empty() => (values as f64 / dim.len() as f64).min(1.0),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acbp_compiler::link;
    use acbp_core::ModelDeclaration;

    use super::*;

    fn function() -> ValidityFunction {
        let decl = ModelDeclaration::new("inpatient")
            .with_flags(["admitted", "in_icu"])
            .with_category("ward", ["Medical", "ICU", "Surgical", "Maternity"])
            .with_category("payer", ["Public", "Private"])
            .with_rule(Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical")))
            .with_rule(Rule::cat_forbid(Predicate::eq("payer", "Private")));
        link(Arc::new(Model::load(decl).unwrap())).unwrap()
    }

    #[test]
    fn test_estimate_by_scan() {
        let f = function();
        let est = estimate(&f, &[0, 1, 2, 3], 1_000);
        assert_eq!(est.valid_masks, 4);
        assert_eq!(est.category_count, 8);
        assert_eq!(est.theoretical_max, 32);
        assert_eq!(est.flags[1].fraction, 0.5);
        assert_eq!(est.forbids.len(), 1);
        assert_eq!(est.forbids[0].bit_fraction, 0.5);
        assert_eq!(est.forbids[0].category_fraction, 0.25);
        assert!((est.estimated_rows - 28.0).abs() < 1e-9);
        assert_eq!(est.notes.len(), 1);
    }

    #[test]
    fn test_estimate_without_scan_uses_field_shares() {
        let f = function();
        let est = estimate(&f, &[0, 1, 2, 3], 1);
        assert_eq!(est.forbids[0].category_fraction, 0.25);
    }

    #[test]
    fn test_estimate_with_no_valid_masks() {
        let est = estimate(&function(), &[], 1_000);
        assert_eq!(est.theoretical_max, 0);
        assert_eq!(est.estimated_rows, 0.0);
        assert!(est.flags.iter().all(|f| f.fraction == 0.0));
    }
}
