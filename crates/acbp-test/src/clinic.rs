//! Outpatient clinic visit fixture.

use std::sync::Arc;

use acbp_compiler::{link, ValidityFunction};
use acbp_core::{Mask, Model, ModelDeclaration, Predicate, Rule};
use rand::Rng;

use crate::sampler::{self, weighted};

pub const FLAGS: [&str; 5] = ["booked", "checked_in", "seen_by_doctor", "canceled", "rescheduled"];

pub const BOOKED: Mask = 1 << 0;
pub const CHECKED_IN: Mask = 1 << 1;
pub const SEEN_BY_DOCTOR: Mask = 1 << 2;
pub const CANCELED: Mask = 1 << 3;
pub const RESCHEDULED: Mask = 1 << 4;

pub const APPT_TYPES: [&str; 5] = ["NewPatient", "FollowUp", "Urgent", "Procedure", "Teleconsult"];
pub const MODALITIES: [&str; 2] = ["InPerson", "Virtual"];
pub const DEPARTMENTS: [&str; 5] = [
    "General",
    "Cardiology",
    "Orthopedics",
    "Imaging",
    "Pediatrics",
];

pub fn declaration() -> ModelDeclaration {
    ModelDeclaration::new("clinic_visit")
        .with_flags(FLAGS)
        .with_category("appt_type", APPT_TYPES)
        .with_category("modality", MODALITIES)
        .with_category("department", DEPARTMENTS)
        .with_rule(Rule::bit_implies("checked_in", "booked"))
        .with_rule(Rule::bit_implies("seen_by_doctor", "checked_in"))
        .with_rule(Rule::bit_implies("canceled", "booked"))
        .with_rule(Rule::bit_implies("rescheduled", "booked"))
        .with_rule(Rule::mutex("canceled", "checked_in"))
        .with_rule(Rule::mutex("canceled", "rescheduled"))
        .with_rule_id(
            "teleconsult_is_virtual",
            Rule::cat_forbid(Predicate::all(vec![
                Predicate::eq("appt_type", "Teleconsult"),
                Predicate::eq("modality", "InPerson"),
            ])),
        )
        .with_rule_id(
            "virtual_visit_types",
            Rule::cat_forbid(Predicate::all(vec![
                Predicate::eq("modality", "Virtual"),
                Predicate::not_in("appt_type", ["FollowUp", "Teleconsult"]),
            ])),
        )
        .with_rule_id(
            "virtual_departments",
            Rule::cat_forbid(Predicate::all(vec![
                Predicate::eq("modality", "Virtual"),
                Predicate::is_in("department", ["Imaging", "Orthopedics"]),
            ])),
        )
}

pub fn model() -> Arc<Model> {
    match Model::load(declaration()) {
        Ok(model) => Arc::new(model),
        Err(err) => panic!("clinic fixture must load: {err}"),
    }
}

pub fn function() -> ValidityFunction {
    match link(model()) {
        Ok(function) => function,
        Err(err) => panic!("clinic fixture must link: {err}"),
    }
}

/// Samples `n` observed `(mask, values)` records, about 6% inconsistent.
pub fn sample_observations(seed: u64, n: usize) -> Vec<(Mask, Vec<String>)> {
    let mut rng = sampler::rng(seed);
    (0..n).map(|_| sample_row(&mut rng)).collect()
}

fn sample_row<R: Rng>(rng: &mut R) -> (Mask, Vec<String>) {
    let mut appt = weighted(
        rng,
        &[
            ("NewPatient", 0.24),
            ("FollowUp", 0.35),
            ("Urgent", 0.18),
            ("Procedure", 0.13),
            ("Teleconsult", 0.10),
        ],
    );
    let mut modality = weighted(rng, &[("InPerson", 0.8), ("Virtual", 0.2)]);
    let department = weighted(
        rng,
        &[
            ("General", 0.35),
            ("Cardiology", 0.13),
            ("Orthopedics", 0.14),
            ("Imaging", 0.18),
            ("Pediatrics", 0.20),
        ],
    );

    if appt == "Teleconsult" {
        modality = "Virtual";
    }
    if modality == "Virtual" && appt != "FollowUp" && appt != "Teleconsult" {
        appt = sampler::uniform(rng, &["FollowUp", "Teleconsult"]);
    }
    if modality == "Virtual" && (department == "Imaging" || department == "Orthopedics") {
        modality = "InPerson";
        if appt == "Teleconsult" {
            appt = "FollowUp";
        }
    }

    let mut mask = match weighted(
        rng,
        &[
            ("canceled", 0.10),
            ("rescheduled", 0.12),
            ("booked_only", 0.18),
            ("checked_in", 0.25),
            ("seen", 0.35),
        ],
    ) {
        "canceled" => CANCELED | BOOKED,
        "rescheduled" => RESCHEDULED | BOOKED,
        "booked_only" => BOOKED,
        "checked_in" => CHECKED_IN | BOOKED,
        _ => SEEN_BY_DOCTOR | CHECKED_IN | BOOKED,
    };

    if rng.random_bool(0.06) {
        mask = if rng.random_bool(0.5) {
            CHECKED_IN
        } else {
            SEEN_BY_DOCTOR | if rng.random_bool(0.5) { BOOKED } else { 0 }
        };
    }

    (
        mask,
        vec![appt.to_string(), modality.to_string(), department.to_string()],
    )
}
