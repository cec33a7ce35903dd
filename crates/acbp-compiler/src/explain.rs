//! Per-rule explanations.

use std::fmt;

use acbp_core::{CategoryTuple, Mask, RuleKind};

use crate::linker::ValidityFunction;

/// Outcome of one clause for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    /// The clause needs a category tuple and none was given.
    NotApplicable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::NotApplicable => "not_applicable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleVerdict {
    pub rule_id: String,
    pub kind: RuleKind,
    pub verdict: Verdict,
}

/// Ordered verdicts for every clause, in clause order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub mask: Mask,
    /// Bits set at or above the model width; any makes the input invalid.
    pub stray_bits: Mask,
    pub verdicts: Vec<RuleVerdict>,
}

impl Explanation {
    /// Overall validity, or `None` when undecided for lack of a tuple.
    pub fn is_valid(&self) -> Option<bool> {
        if self.stray_bits != 0 || self.failures().next().is_some() {
            return Some(false);
        }
        if self
            .verdicts
            .iter()
            .any(|v| v.verdict == Verdict::NotApplicable)
        {
            return None;
        }
        Some(true)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleVerdict> {
        self.verdicts.iter().filter(|v| v.verdict == Verdict::Fail)
    }
}

/// Evaluates every clause independently for `mask` and an optional tuple.
pub fn explain(
    function: &ValidityFunction,
    mask: Mask,
    tuple: Option<&CategoryTuple>,
) -> Explanation {
    let verdicts = function
        .clauses()
        .iter()
        .map(|clause| {
            let verdict = match tuple {
                Some(tuple) => pass_or_fail(clause.eval(mask, tuple)),
                None if clause.is_category_dependent() => Verdict::NotApplicable,
                None => pass_or_fail(clause.relax(mask).unwrap_or(true)),
            };
            RuleVerdict {
                rule_id: clause.rule_id().to_string(),
                kind: clause.kind(),
                verdict,
            }
        })
        .collect();

    Explanation {
        mask,
        stray_bits: if function.in_width(mask) {
            0
        } else {
            mask & !acbp_core::mask::width_mask(function.model().width())
        },
        verdicts,
    }
}

fn pass_or_fail(ok: bool) -> Verdict {
    if ok {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}
