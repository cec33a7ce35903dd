//! Inpatient admission fixture.
//!
//! Flags follow an admission lifecycle; categories describe how the
//! patient arrived and where they are placed.

use std::sync::Arc;

use acbp_compiler::{link, ValidityFunction};
use acbp_core::{Mask, Model, ModelDeclaration, Predicate, Rule};
use rand::Rng;

use crate::sampler::{self, weighted};

pub const FLAGS: [&str; 6] = [
    "booked",
    "checked_in",
    "in_icu",
    "discharged",
    "expired",
    "transferred",
];

pub const BOOKED: Mask = 1 << 0;
pub const CHECKED_IN: Mask = 1 << 1;
pub const IN_ICU: Mask = 1 << 2;
pub const DISCHARGED: Mask = 1 << 3;
pub const EXPIRED: Mask = 1 << 4;
pub const TRANSFERRED: Mask = 1 << 5;

pub const ADMISSION_TYPES: [&str; 3] = ["Elective", "Emergency", "Transfer"];
pub const WARDS: [&str; 4] = ["Medical", "Surgical", "ICU", "StepDown"];
pub const ARRIVAL_SOURCES: [&str; 4] = ["ED", "Clinic", "Transfer", "Direct"];

/// The inpatient model declaration.
pub fn declaration() -> ModelDeclaration {
    ModelDeclaration::new("inpatient_admission")
        .with_flags(FLAGS)
        .with_category("admission_type", ADMISSION_TYPES)
        .with_category("ward", WARDS)
        .with_category("arrival_source", ARRIVAL_SOURCES)
        .with_rule(Rule::bit_implies("checked_in", "booked"))
        .with_rule(Rule::bit_implies("in_icu", "checked_in"))
        .with_rule(Rule::bit_implies("discharged", "checked_in"))
        .with_rule(Rule::bit_implies("expired", "checked_in"))
        .with_rule(Rule::bit_implies("transferred", "checked_in"))
        .with_rule(Rule::mutex("discharged", "expired"))
        .with_rule_id(
            "icu_needs_icu_ward",
            Rule::bit_forbid(["in_icu"], Predicate::not_eq("ward", "ICU")),
        )
        .with_rule_id(
            "emergency_unbooked",
            Rule::bit_forbid(["booked"], Predicate::eq("admission_type", "Emergency")),
        )
        .with_rule_id(
            "no_discharge_after_transfer",
            Rule::bit_forbid(["discharged"], Predicate::eq("arrival_source", "Transfer")),
        )
        .with_rule_id(
            "transfer_arrives_by_transfer",
            Rule::implies(["transferred"], Predicate::eq("arrival_source", "Transfer")),
        )
}

pub fn model() -> Arc<Model> {
    match Model::load(declaration()) {
        Ok(model) => Arc::new(model),
        Err(err) => panic!("inpatient fixture must load: {err}"),
    }
}

pub fn function() -> ValidityFunction {
    match link(model()) {
        Ok(function) => function,
        Err(err) => panic!("inpatient fixture must link: {err}"),
    }
}

/// The same model as a YAML document.
pub const MODEL_YAML: &str = r#"
name: inpatient_admission
flags: [booked, checked_in, in_icu, discharged, expired, transferred]
categories:
  admission_type: [Elective, Emergency, Transfer]
  ward: [Medical, Surgical, ICU, StepDown]
  arrival_source: [ED, Clinic, Transfer, Direct]
constraints:
  - {type: implies, when_bits: [checked_in], require_bits: [booked]}
  - {type: implies, when_bits: [in_icu], require_bits: [checked_in]}
  - {type: implies, when_bits: [discharged], require_bits: [checked_in]}
  - {type: implies, when_bits: [expired], require_bits: [checked_in]}
  - {type: implies, when_bits: [transferred], require_bits: [checked_in]}
  - {type: mutex, a: discharged, b: expired}
  - id: icu_needs_icu_ward
    type: bit_forbid
    forbid_when: [in_icu]
    predicate: {ne: {ward: ICU}}
  - id: emergency_unbooked
    type: bit_forbid
    forbid_when: [booked]
    predicate: {admission_type: Emergency}
  - id: no_discharge_after_transfer
    type: bit_forbid
    forbid_when: [discharged]
    predicate: {arrival_source: Transfer}
  - id: transfer_arrives_by_transfer
    type: implies
    when_bits: [transferred]
    require: {arrival_source: Transfer}
"#;

/// Samples `n` observed `(mask, values)` records.
///
/// Most records follow the admission lifecycle and satisfy the rules; about
/// one in twenty is deliberately inconsistent.
pub fn sample_observations(seed: u64, n: usize) -> Vec<(Mask, Vec<String>)> {
    let mut rng = sampler::rng(seed);
    (0..n).map(|_| sample_row(&mut rng)).collect()
}

fn sample_row<R: Rng>(rng: &mut R) -> (Mask, Vec<String>) {
    let mut admission = weighted(
        rng,
        &[("Elective", 0.45), ("Emergency", 0.25), ("Transfer", 0.30)],
    );
    let mut ward = weighted(
        rng,
        &[("Medical", 0.40), ("Surgical", 0.28), ("ICU", 0.20), ("StepDown", 0.12)],
    );
    let mut source = weighted(
        rng,
        &[("ED", 0.55), ("Clinic", 0.25), ("Transfer", 0.10), ("Direct", 0.10)],
    );

    let stage = weighted(
        rng,
        &[
            ("unbooked", 0.08),
            ("booked_only", 0.14),
            ("checked_in", 0.32),
            ("icu", 0.12),
            ("discharged", 0.22),
            ("expired", 0.04),
            ("transferred", 0.08),
        ],
    );
    let admitted = BOOKED | CHECKED_IN;
    let mut mask = match stage {
        "unbooked" => 0,
        "booked_only" => BOOKED,
        "checked_in" => admitted,
        "icu" => {
            ward = "ICU";
            admitted | IN_ICU
        }
        "discharged" => admitted | DISCHARGED,
        "expired" => admitted | EXPIRED,
        _ => {
            source = "Transfer";
            admitted | TRANSFERRED
        }
    };
    if mask & DISCHARGED != 0 && source == "Transfer" {
        source = "ED";
    }

    if admission == "Emergency" && mask != 0 {
        if rng.random_bool(0.85) {
            admission = sampler::uniform(rng, &["Elective", "Transfer"]);
        } else {
            mask = 0;
        }
    }

    if rng.random_bool(0.05) {
        let fault = sampler::uniform(
            rng,
            &[
                "icu_wrong_ward",
                "discharged_without_check_in",
                "discharged_after_transfer",
            ],
        );
        match fault {
            "icu_wrong_ward" => {
                mask = admitted | IN_ICU;
                ward = sampler::uniform(rng, &["Medical", "Surgical", "StepDown"]);
                admission = "Elective";
            }
            "discharged_without_check_in" => {
                mask = DISCHARGED | if rng.random_bool(0.5) { BOOKED } else { 0 };
            }
            _ => {
                mask = admitted | DISCHARGED;
                source = "Transfer";
            }
        }
    }

    (
        mask,
        vec![admission.to_string(), ward.to_string(), source.to_string()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_links() {
        let f = function();
        assert_eq!(f.model().width(), 6);
        assert_eq!(f.model().category_count(), 48);
        assert_eq!(f.clauses().len(), 10);
    }

    #[test]
    fn test_sampler_is_deterministic_and_mostly_valid() {
        let f = function();
        let rows = sample_observations(11, 400);
        assert_eq!(rows, sample_observations(11, 400));

        let valid = rows
            .iter()
            .filter(|(mask, values)| f.is_valid_values(*mask, values.as_slice()).unwrap())
            .count();
        assert!(valid >= 340, "only {valid} of 400 sampled rows are valid");
        assert!(valid < 400);
    }
}
