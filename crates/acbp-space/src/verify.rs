//! Verification of materialized decision spaces.
//!
//! Each check runs independently over the supplied artifacts and reports a
//! violation count; a failed check never aborts the others.

use std::collections::{HashMap, HashSet};
use std::fmt;

use acbp_compiler::ValidityFunction;
use acbp_core::{CategoryTuple, Mask};
use tracing::{info, warn};

use crate::enumerate::{DecisionRow, DecisionSpace};

/// Violations listed per check before truncation.
const DETAIL_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckName {
    Soundness,
    Coverage,
    KeyUniqueness,
    ActionDeterminism,
    ProjectionExactness,
    Completeness,
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckName::Soundness => "soundness",
            CheckName::Coverage => "coverage",
            CheckName::KeyUniqueness => "key_uniqueness",
            CheckName::ActionDeterminism => "action_determinism",
            CheckName::ProjectionExactness => "projection_exactness",
            CheckName::Completeness => "completeness",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The artifact the check needs was not supplied.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub check: CheckName,
    pub status: CheckStatus,
    pub violations: u64,
    pub details: Vec<String>,
}

impl CheckResult {
    fn skipped(check: CheckName) -> Self {
        Self {
            check,
            status: CheckStatus::Skipped,
            violations: 0,
            details: Vec::new(),
        }
    }

    fn from_violations(check: CheckName, violations: Vec<String>) -> Self {
        let count = violations.len() as u64;
        Self {
            check,
            status: if count == 0 {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            },
            violations: count,
            details: violations.into_iter().take(DETAIL_LIMIT).collect(),
        }
    }
}

/// Outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    /// True when no check failed; skipped checks count as passing.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn check(&self, name: CheckName) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == name)
    }

    pub fn total_violations(&self) -> u64 {
        self.checks.iter().map(|c| c.violations).sum()
    }
}

/// A verification run over materialized artifacts.
///
/// `rows` and `masks` are taken as stored, in any order and possibly
/// corrupted; nothing about them is assumed.
pub struct Verification<'a> {
    function: &'a ValidityFunction,
    rows: &'a [DecisionRow],
    masks: &'a [Mask],
    actions: Option<&'a [(DecisionRow, String)]>,
    recomputed: Option<&'a DecisionSpace>,
}

impl<'a> Verification<'a> {
    pub fn new(function: &'a ValidityFunction, rows: &'a [DecisionRow], masks: &'a [Mask]) -> Self {
        Self {
            function,
            rows,
            masks,
            actions: None,
            recomputed: None,
        }
    }

    /// Attaches a decision mapping from keys to actions.
    pub fn with_actions(mut self, actions: &'a [(DecisionRow, String)]) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Attaches a freshly enumerated space to check completeness against.
    pub fn with_recomputed(mut self, space: &'a DecisionSpace) -> Self {
        self.recomputed = Some(space);
        self
    }

    pub fn run(&self) -> VerificationReport {
        let row_masks: HashSet<Mask> = self.rows.iter().map(|r| r.mask).collect();
        let stored_masks: HashSet<Mask> = self.masks.iter().copied().collect();

        let checks = vec![
            self.soundness(),
            coverage(&stored_masks, &row_masks),
            self.key_uniqueness(),
            self.action_determinism(),
            projection_exactness(&row_masks, &stored_masks),
            self.completeness(),
        ];
        let report = VerificationReport { checks };

        for failed in report.checks.iter().filter(|c| c.status == CheckStatus::Fail) {
            warn!(
                event = "verification_violation",
                check = %failed.check,
                violations = failed.violations,
            );
        }
        info!(
            event = "verification_end",
            model = self.function.model().name(),
            rows = self.rows.len(),
            masks = self.masks.len(),
            passed = report.passed(),
            violations = report.total_violations(),
        );
        report
    }

    fn soundness(&self) -> CheckResult {
        let model = self.function.model();
        let violations = self
            .rows
            .iter()
            .filter(|r| {
                model.check_tuple(&r.tuple).is_err() || !self.function.is_valid(r.mask, &r.tuple)
            })
            .map(|r| self.describe(r))
            .collect();
        CheckResult::from_violations(CheckName::Soundness, violations)
    }

    fn key_uniqueness(&self) -> CheckResult {
        let mut seen: HashSet<(Mask, &CategoryTuple)> = HashSet::with_capacity(self.rows.len());
        let violations = self
            .rows
            .iter()
            .filter(|r| !seen.insert((r.mask, &r.tuple)))
            .map(|r| format!("duplicate key {}", self.describe(r)))
            .collect();
        CheckResult::from_violations(CheckName::KeyUniqueness, violations)
    }

    fn action_determinism(&self) -> CheckResult {
        let Some(actions) = self.actions else {
            return CheckResult::skipped(CheckName::ActionDeterminism);
        };
        let mut by_key: HashMap<&DecisionRow, HashSet<&str>> = HashMap::new();
        let mut order: Vec<&DecisionRow> = Vec::new();
        for (key, action) in actions {
            let entry = by_key.entry(key).or_insert_with(|| {
                order.push(key);
                HashSet::new()
            });
            entry.insert(action.as_str());
        }
        let violations = order
            .into_iter()
            .filter(|key| by_key[key].len() > 1)
            .map(|key| format!("{} maps to {} actions", self.describe(key), by_key[key].len()))
            .collect();
        CheckResult::from_violations(CheckName::ActionDeterminism, violations)
    }

    fn completeness(&self) -> CheckResult {
        let Some(recomputed) = self.recomputed else {
            return CheckResult::skipped(CheckName::Completeness);
        };
        let stored: HashSet<&DecisionRow> = self.rows.iter().collect();
        let violations = recomputed
            .iter()
            .filter(|r| !stored.contains(r))
            .map(|r| format!("missing row {}", self.describe(r)))
            .collect();
        CheckResult::from_violations(CheckName::Completeness, violations)
    }

    fn describe(&self, row: &DecisionRow) -> String {
        let model = self.function.model();
        match model.check_tuple(&row.tuple) {
            Ok(()) => format!(
                "(mask={}, [{}])",
                row.mask,
                model.tuple_values(&row.tuple).join(", ")
            ),
            Err(err) => format!("(mask={}, {:?}: {err})", row.mask, row.tuple.as_slice()),
        }
    }
}

fn coverage(stored_masks: &HashSet<Mask>, row_masks: &HashSet<Mask>) -> CheckResult {
    let mut uncovered: Vec<Mask> = stored_masks.difference(row_masks).copied().collect();
    uncovered.sort_unstable();
    let violations = uncovered
        .into_iter()
        .map(|m| format!("mask {m} has no decision row"))
        .collect();
    CheckResult::from_violations(CheckName::Coverage, violations)
}

fn projection_exactness(row_masks: &HashSet<Mask>, stored_masks: &HashSet<Mask>) -> CheckResult {
    let mut missing: Vec<Mask> = row_masks.difference(stored_masks).copied().collect();
    missing.sort_unstable();
    let violations = missing
        .into_iter()
        .map(|m| format!("mask {m} occurs in the decision space but not in the mask set"))
        .collect();
    CheckResult::from_violations(CheckName::ProjectionExactness, violations)
}
