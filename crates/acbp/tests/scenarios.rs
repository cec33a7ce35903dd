//! End-to-end behavior of compiled policies on small hand-checked models.

use acbp::prelude::*;
use acbp::{CheckName, CheckStatus, EnumerationThreads, PresentOnlyWarning};

fn compile(decl: ModelDeclaration) -> CompiledPolicy {
    acbp_test::init_tracing();
    CompiledPolicy::compile(decl, EngineConfig::default()).unwrap()
}

const NO_VALUES: &[&str] = &[];

#[test]
fn test_bit_implication() {
    let policy = compile(
        ModelDeclaration::new("visit")
            .with_flags(["booked", "checked_in"])
            .with_rule(Rule::bit_implies("checked_in", "booked")),
    );

    assert!(!policy.is_valid_values(2, NO_VALUES).unwrap());
    assert!(policy.is_valid_values(3, NO_VALUES).unwrap());
    assert!(policy.is_valid_values(0, NO_VALUES).unwrap());
    assert_eq!(policy.valid_masks().unwrap().as_slice(), &[0, 1, 3]);
}

#[test]
fn test_mutex_ignores_categories() {
    let policy = compile(acbp_test::inpatient::declaration());
    let both = acbp_test::inpatient::DISCHARGED | acbp_test::inpatient::EXPIRED;
    assert_eq!(both, 24);

    assert!(!policy.is_valid_mask(both | 0b11));
    for tuple in policy.model().tuples() {
        assert!(!policy.is_valid(both | 0b11, &tuple));
    }
}

#[test]
fn test_category_conditioned_bit_forbid() {
    let policy = compile(
        ModelDeclaration::new("ward")
            .with_flags(["booked", "checked_in", "in_icu"])
            .with_category("ward", ["Medical", "ICU"])
            .with_rule(Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical"))),
    );

    for mask in 0..8u64 {
        let medical = policy.is_valid_values(mask, &["Medical"]).unwrap();
        let icu = policy.is_valid_values(mask, &["ICU"]).unwrap();
        assert_eq!(medical, mask & 0b100 == 0, "mask {mask}");
        assert!(icu, "mask {mask}");
    }

    let explanation = policy.explain_values(0b100, Some(&["Medical"][..])).unwrap();
    assert_eq!(explanation.is_valid(), Some(false));
    assert_eq!(explanation.failures().count(), 1);
}

#[test]
fn test_guardrail_refusal_keeps_validator() {
    let decl = ModelDeclaration::new("wide")
        .with_flags(["a", "b", "c", "d", "e", "f"])
        .with_category("region", ["North", "South"]);
    let config = EngineConfig::default().with_enumeration_limit_bits(5);
    let policy = CompiledPolicy::compile(decl, config).unwrap();

    assert!(!policy.complexity().enumeration_allowed());
    let err = policy.decision_space().unwrap_err();
    assert_eq!(err.effective_bits, 6);
    assert_eq!(err.limit_bits, 5);
    assert!(policy.valid_masks().is_err());
    assert!(policy.sizing_estimate().is_err());

    assert!(policy.is_valid_mask(0b111111));
    assert!(policy.is_valid_values(0b101010, &["South"]).unwrap());
    assert!(policy.is_mask_reachable(0b000001));

    let report = policy.verify(&[], &[]);
    assert_eq!(
        report.check(CheckName::Completeness).map(|c| c.status),
        Some(CheckStatus::Skipped)
    );
}

#[test]
fn test_full_width_model_is_refused_not_emptied() {
    let decl = ModelDeclaration::new("full")
        .with_flags((0..64).map(|i| format!("f{i}")).collect::<Vec<_>>());
    let config = EngineConfig::from_toml_str("enumeration_limit_bits = 64").unwrap();
    let policy = CompiledPolicy::compile(decl, config).unwrap();

    assert!(policy.is_valid(0, &CategoryTuple::empty()));
    let err = policy.decision_space().unwrap_err();
    assert_eq!(err.effective_bits, 64);
    assert!(policy.valid_masks().is_err());
}

#[test]
fn test_present_only_bounds() {
    let policy = compile(acbp_test::inpatient::declaration());
    let space = policy.decision_space().unwrap();
    let model = policy.model();

    let none = policy.present_only(&space, &Vec::<Vec<String>>::new());
    assert!(none.space.is_empty());
    assert_eq!(none.warning, Some(PresentOnlyWarning::EmptyInput));

    let everything: Vec<Vec<&str>> = model.tuples().map(|t| model.tuple_values(&t)).collect();
    let full = policy.present_only(&space, &everything);
    assert_eq!(full.space, space);
    assert_eq!(full.warning, None);

    let malformed = policy.present_only(&space, &[vec!["Elective", "Medical", "Nowhere"]]);
    assert!(malformed.space.is_empty());
    assert!(matches!(
        malformed.warning,
        Some(PresentOnlyWarning::MalformedRow { row: 0, .. })
    ));
}

#[test]
fn test_projection_matches_reachability() {
    let policy = compile(acbp_test::clinic::declaration());
    let artifacts = policy.artifacts().unwrap();

    for mask in 0..1u64 << policy.model().width() {
        assert_eq!(
            artifacts.masks.contains(mask),
            policy.is_mask_reachable(mask),
            "mask {mask:#b}"
        );
        assert_eq!(
            artifacts.masks.contains(mask),
            artifacts.space.iter().any(|r| r.mask == mask)
        );
    }
    assert!(policy.dead_masks(&artifacts.masks).unwrap().is_empty());
}

#[test]
fn test_dead_masks_from_category_rules() {
    // in_icu requires ICU, and ICU is forbidden outright
    let policy = compile(
        ModelDeclaration::new("dead")
            .with_flags(["admitted", "in_icu"])
            .with_category("ward", ["Medical", "ICU"])
            .with_rule(Rule::implies(["in_icu"], Predicate::eq("ward", "ICU")))
            .with_rule(Rule::cat_forbid(Predicate::eq("ward", "ICU"))),
    );
    let masks = policy.valid_masks().unwrap();
    assert_eq!(masks.as_slice(), &[0b00, 0b01]);
    assert_eq!(policy.dead_masks(&masks).unwrap(), vec![0b10, 0b11]);
    assert!(policy.is_valid_mask(0b10));
    assert!(!policy.is_mask_reachable(0b10));
}

#[test]
fn test_reduction_and_threads_agree() {
    let decl = acbp_test::inpatient::declaration();
    let baseline = compile(decl.clone()).decision_space().unwrap();

    let configs = [
        EngineConfig::default().with_bit_reduction(acbp::BitReduction::Off),
        EngineConfig::default().with_enumeration_threads(EnumerationThreads::Auto),
        EngineConfig::default().with_enumeration_threads(EnumerationThreads::Count(4)),
    ];
    for config in configs {
        let policy = CompiledPolicy::compile(decl.clone(), config).unwrap();
        assert_eq!(policy.decision_space().unwrap(), baseline);
    }
}

#[test]
fn test_compilation_is_idempotent() {
    let first = compile(acbp_test::clinic::declaration());
    let second = compile(acbp_test::clinic::declaration());
    assert_eq!(first.decision_space().unwrap(), second.decision_space().unwrap());
    assert_eq!(
        first.function().clauses().len(),
        second.function().clauses().len()
    );
}

#[test]
fn test_verify_stored_artifacts() {
    let policy = compile(acbp_test::inpatient::declaration());
    let artifacts = policy.artifacts().unwrap();
    let rows = artifacts.space.rows().to_vec();
    let masks = artifacts.masks.as_slice().to_vec();

    let actions: Vec<(DecisionRow, String)> = rows
        .iter()
        .map(|r| (r.clone(), format!("route-{}", r.mask)))
        .collect();
    let report = policy.verify_with_actions(&rows, &masks, &actions);
    assert!(report.passed(), "{report:?}");
    assert_eq!(report.total_violations(), 0);

    // drop one row and inject an invalid one
    let mut corrupted = rows[1..].to_vec();
    corrupted.push(DecisionRow::new(
        acbp_test::inpatient::DISCHARGED | acbp_test::inpatient::EXPIRED,
        rows[0].tuple.clone(),
    ));
    let report = policy.verify(&corrupted, &masks);
    assert!(!report.passed());
    let status = |name| report.check(name).map(|c| c.status);
    assert_eq!(status(CheckName::Soundness), Some(CheckStatus::Fail));
    assert_eq!(status(CheckName::Completeness), Some(CheckStatus::Fail));
    assert_eq!(status(CheckName::KeyUniqueness), Some(CheckStatus::Pass));
    assert_eq!(status(CheckName::ActionDeterminism), Some(CheckStatus::Skipped));
}

#[test]
fn test_audit_and_estimate() {
    let config = EngineConfig::default().with_audit_sample_size(3);
    let policy = CompiledPolicy::compile(acbp_test::inpatient::declaration(), config).unwrap();

    let observed = acbp_test::inpatient::sample_observations(7, 400);
    let audit = policy.audit(&observed);
    assert_eq!(audit.total, 400);
    assert_eq!(audit.valid + audit.invalid, 400);
    assert!(audit.sample.len() <= 3);
    assert!(audit.valid > audit.invalid);

    let estimate = policy.sizing_estimate().unwrap();
    let rows = policy.decision_space().unwrap().len() as f64;
    assert_eq!(estimate.category_count, 48);
    assert!(estimate.estimated_rows <= estimate.theoretical_max as f64);
    assert!(rows <= estimate.theoretical_max as f64);
}
