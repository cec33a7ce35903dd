//! Rule linking.
//!
//! Each rule compiles to one [`Clause`]; [`link`] folds them into a single
//! [`ValidityFunction`], the conjunction of all clauses. Clause order is
//! rule declaration order, followed by the implicit reserved-bits clause
//! when the width leaves positions undeclared.

mod clause;


use std::fmt;
use std::sync::Arc;

use acbp_core::mask::width_mask;
use acbp_core::{CategoryTuple, CompileError, Mask, Model, TupleError};
use tracing::{debug, info};

pub use clause::{Clause, ClauseShape};

use clause::{compile_rule, reserved_bits_clause};

/// Compiles every rule of `model` and conjoins the clauses.
///
/// # Errors
///
/// Returns the first clause that fails to compile; nothing is partially
/// linked.
pub fn link(model: Arc<Model>) -> Result<ValidityFunction, CompileError> {
    let clauses = model
        .rules()
        .iter()
        .map(|def| {
            let clause = compile_rule(&model, def)?;
            debug!(
                event = "clause_compiled",
                rule_id = clause.rule_id(),
                kind = %clause.kind(),
                category_dependent = clause.is_category_dependent(),
            );
            Ok(clause)
        })
        .chain(reserved_bits_clause(&model).map(Ok))
        .collect::<Result<Vec<_>, CompileError>>()?;

    let function = ValidityFunction {
        width_mask: width_mask(model.width()),
        clauses: clauses.into(),
        model,
    };
    info!(
        event = "link_end",
        model = function.model.name(),
        width = function.model.width(),
        clauses = function.clauses.len(),
        category_dependent = function.category_dependent_count(),
    );
    Ok(function)
}

/// The composite validity predicate of one model edition.
///
/// Cloning is cheap; clauses and model are shared.
#[derive(Clone)]
pub struct ValidityFunction {
    model: Arc<Model>,
    clauses: Arc<[Clause]>,
    width_mask: Mask,
}

impl ValidityFunction {
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Tagged clauses in evaluation order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn category_dependent_count(&self) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.is_category_dependent())
            .count()
    }

    /// Returns true if no bit is set at or above the model width.
    #[inline]
    pub fn in_width(&self, mask: Mask) -> bool {
        mask & !self.width_mask == 0
    }

    /// Evaluates ACBP(mask, tuple).
    ///
    /// `tuple` is expected to come from this model; see
    /// [`Model::check_tuple`] for tuples built elsewhere.
    pub fn is_valid(&self, mask: Mask, tuple: &CategoryTuple) -> bool {
        self.in_width(mask) && self.clauses.iter().all(|c| c.eval(mask, tuple))
    }

    /// Evaluates ACBP with category values given by name, in dimension
    /// order.
    pub fn is_valid_values<S: AsRef<str>>(
        &self,
        mask: Mask,
        values: &[S],
    ) -> Result<bool, TupleError> {
        let tuple = self.model.resolve_tuple(values)?;
        Ok(self.is_valid(mask, &tuple))
    }

    /// Bit-only check: every clause's relaxation accepts `mask`.
    ///
    /// Necessary for `mask` to appear in the decision space, not
    /// sufficient.
    pub fn is_valid_mask(&self, mask: Mask) -> bool {
        self.in_width(mask) && self.clauses.iter().all(|c| c.relax(mask) != Some(false))
    }

    /// Exact check that at least one category tuple makes `mask` valid.
    ///
    /// Scans the category space; cost is proportional to |C|.
    pub fn is_mask_reachable(&self, mask: Mask) -> bool {
        self.is_valid_mask(mask) && self.model.tuples().any(|t| self.is_valid(mask, &t))
    }
}

impl fmt::Debug for ValidityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidityFunction")
            .field("model", &self.model.name())
            .field("width", &self.model.width())
            .field("clauses", &self.clauses)
            .finish()
    }
}
