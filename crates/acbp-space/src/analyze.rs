//! Complexity analysis and the enumeration guardrail.

use acbp_compiler::ValidityFunction;
use acbp_config::EngineConfig;
use acbp_core::{EnumerationBudgetExceeded, RuleKind, MAX_WIDTH};
use tracing::{info, warn};

use crate::reduction::ReductionPlan;

/// Size of a model's decision space, computed before enumerating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexityReport {
    /// Declared width B.
    pub declared_bits: u32,
    /// Effective width B_eff after proven reductions.
    pub effective_bits: u32,
    /// |C|, saturating.
    pub category_count: u128,
    /// n_eff: tuples not excluded by category-only rules.
    pub effective_categories: u128,
    /// False when the category space exceeded the scan limit and
    /// `effective_categories` is the unreduced |C|.
    pub categories_exact: bool,
    /// 2^B_eff × n_eff, saturating.
    pub complexity: u128,
    /// Configured limit, capped below the mask width since a full 64-bit
    /// candidate range cannot be counted in a `u64`.
    pub limit_bits: u32,
    pub plan: ReductionPlan,
}

impl ComplexityReport {
    pub fn enumeration_allowed(&self) -> bool {
        self.effective_bits <= self.limit_bits
    }

    /// Refuses enumeration when B_eff exceeds the configured limit.
    pub fn check_guardrail(&self) -> Result<(), EnumerationBudgetExceeded> {
        if self.enumeration_allowed() {
            Ok(())
        } else {
            Err(EnumerationBudgetExceeded {
                declared_bits: self.declared_bits,
                effective_bits: self.effective_bits,
                limit_bits: self.limit_bits,
            })
        }
    }
}

/// Derives B_eff, n_eff and the guardrail decision for one compiled model.
pub fn analyze(function: &ValidityFunction, config: &EngineConfig) -> ComplexityReport {
    let model = function.model();
    let plan = ReductionPlan::derive(function, config.bit_reduction);
    let category_count = model.category_count();
    let (effective_categories, categories_exact) =
        effective_categories(function, category_count, config.category_scan_limit);

    let complexity = plan.candidate_count().saturating_mul(effective_categories);
    let report = ComplexityReport {
        declared_bits: model.width(),
        effective_bits: plan.effective_bits(),
        category_count,
        effective_categories,
        categories_exact,
        complexity,
        limit_bits: config.enumeration_limit_bits.min(MAX_WIDTH - 1),
        plan,
    };

    info!(
        event = "analyze",
        model = model.name(),
        declared_bits = report.declared_bits,
        effective_bits = report.effective_bits,
        category_count = %report.category_count,
        effective_categories = %report.effective_categories,
        categories_exact = report.categories_exact,
        complexity = %report.complexity,
    );
    if !report.enumeration_allowed() {
        warn!(
            event = "guardrail_refused",
            model = model.name(),
            effective_bits = report.effective_bits,
            limit_bits = report.limit_bits,
        );
    }
    report
}

/// Counts tuples that no category-only clause rejects.
fn effective_categories(
    function: &ValidityFunction,
    category_count: u128,
    scan_limit: u64,
) -> (u128, bool) {
    let cat_forbids: Vec<_> = function
        .clauses()
        .iter()
        .filter(|c| c.kind() == RuleKind::CatForbid)
        .collect();
    if cat_forbids.is_empty() {
        return (category_count, true);
    }
    if category_count > scan_limit as u128 {
        return (category_count, false);
    }

    let count = function
        .model()
        .tuples()
        .filter(|t| cat_forbids.iter().all(|c| c.eval(0, t)))
        .count();
    (count as u128, true)
}
