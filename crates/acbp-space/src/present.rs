//! Present-only reduction.
//!
//! Restricts a decision space to the category tuples actually observed.
//! The result is always a subset of D; input problems degrade to an empty
//! result with a warning, never to the full space.

use std::collections::HashSet;
use std::fmt;

use acbp_core::{CategoryTuple, Model, TupleError};
use tracing::{info, warn};

use crate::enumerate::DecisionSpace;

/// Why a present-only reduction returned nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOnlyWarning {
    EmptyInput,
    MalformedRow { row: usize, error: TupleError },
}

impl fmt::Display for PresentOnlyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentOnlyWarning::EmptyInput => f.write_str("no observed category tuples"),
            PresentOnlyWarning::MalformedRow { row, error } => {
                write!(f, "observed row {row} is malformed: {error}")
            }
        }
    }
}

/// Reduced decision space plus any input warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentOnly {
    pub space: DecisionSpace,
    pub warning: Option<PresentOnlyWarning>,
}

impl PresentOnly {
    fn degraded(warning: PresentOnlyWarning) -> Self {
        warn!(event = "present_only_degraded", warning = %warning);
        Self {
            space: DecisionSpace::default(),
            warning: Some(warning),
        }
    }
}

/// D_present(C′) for observed tuples given by value, in dimension order.
pub fn present_only<R, S>(space: &DecisionSpace, model: &Model, observed: &[R]) -> PresentOnly
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let resolved = observed
        .iter()
        .enumerate()
        .map(|(row, values)| {
            model
                .resolve_tuple(values.as_ref())
                .map_err(|error| PresentOnlyWarning::MalformedRow { row, error })
        })
        .collect::<Result<HashSet<_>, _>>();
    match resolved {
        Ok(tuples) => reduce(space, &tuples),
        Err(warning) => PresentOnly::degraded(warning),
    }
}

/// D_present(C′) for observed tuples already resolved against `model`.
pub fn present_only_tuples(
    space: &DecisionSpace,
    model: &Model,
    observed: &[CategoryTuple],
) -> PresentOnly {
    for (row, tuple) in observed.iter().enumerate() {
        if let Err(error) = model.check_tuple(tuple) {
            return PresentOnly::degraded(PresentOnlyWarning::MalformedRow { row, error });
        }
    }
    let tuples: HashSet<CategoryTuple> = observed.iter().cloned().collect();
    reduce(space, &tuples)
}

fn reduce(space: &DecisionSpace, observed: &HashSet<CategoryTuple>) -> PresentOnly {
    if observed.is_empty() {
        return PresentOnly::degraded(PresentOnlyWarning::EmptyInput);
    }
    let reduced = space.filter_tuples(|t| observed.contains(t));
    info!(
        event = "present_only",
        observed = observed.len(),
        rows = reduced.len(),
        full_rows = space.len(),
    );
    PresentOnly {
        space: reduced,
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acbp_compiler::link;
    use acbp_config::{EngineConfig, EnumerationThreads};
    use acbp_core::{ModelDeclaration, Predicate, Rule};

    use super::*;
    use crate::analyze::analyze;
    use crate::enumerate::Enumerator;

    fn space() -> (Arc<Model>, DecisionSpace) {
        let decl = ModelDeclaration::new("inpatient")
            .with_flags(["admitted", "in_icu"])
            .with_category("ward", ["Medical", "ICU"])
            .with_category("payer", ["Public", "Private"])
            .with_rule(Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical")));
        let model = Arc::new(Model::load(decl).unwrap());
        let f = link(model.clone()).unwrap();
        let report = analyze(&f, &EngineConfig::default());
        let space = Enumerator::new(&f, &report)
            .unwrap()
            .collect(EnumerationThreads::None);
        (model, space)
    }

    #[test]
    fn test_empty_observation_yields_empty() {
        let (model, d) = space();
        let result = present_only::<Vec<&str>, &str>(&d, &model, &[]);
        assert!(result.space.is_empty());
        assert_eq!(result.warning, Some(PresentOnlyWarning::EmptyInput));
    }

    #[test]
    fn test_full_observation_yields_full_space() {
        let (model, d) = space();
        let all: Vec<CategoryTuple> = model.tuples().collect();
        let result = present_only_tuples(&d, &model, &all);
        assert_eq!(result.space, d);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_reduction_keeps_observed_rows_in_order() {
        let (model, d) = space();
        let result = present_only(&d, &model, &[vec!["ICU", "Private"], vec!["Medical", "Public"]]);
        let rows: Vec<(u64, Vec<&str>)> = result
            .space
            .iter()
            .map(|r| (r.mask, model.tuple_values(&r.tuple)))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, vec!["Medical", "Public"]),
                (0, vec!["ICU", "Private"]),
                (1, vec!["Medical", "Public"]),
                (1, vec!["ICU", "Private"]),
                (2, vec!["ICU", "Private"]),
                (3, vec!["ICU", "Private"]),
            ]
        );
    }

    #[test]
    fn test_malformed_row_degrades_to_empty() {
        let (model, d) = space();
        let result = present_only(&d, &model, &[vec!["ICU", "Private"], vec!["ICU"]]);
        assert!(result.space.is_empty());
        assert_eq!(
            result.warning,
            Some(PresentOnlyWarning::MalformedRow {
                row: 1,
                error: TupleError::ArityMismatch {
                    expected: 2,
                    actual: 1
                }
            })
        );

        let result = present_only_tuples(&d, &model, &[CategoryTuple::new([5, 0])]);
        assert!(result.space.is_empty());
        assert!(result.warning.is_some());
    }

    #[test]
    fn test_monotone_in_observed_set() {
        let (model, d) = space();
        let all: Vec<CategoryTuple> = model.tuples().collect();
        for split in 1..all.len() {
            let small = present_only_tuples(&d, &model, &all[..split]).space;
            let large = present_only_tuples(&d, &model, &all[..=split]).space;
            assert!(small.iter().all(|r| large.contains(r.mask, &r.tuple)));
        }
    }
}
