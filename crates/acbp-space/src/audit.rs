//! Audit of externally observed records against the validity function.

use acbp_compiler::ValidityFunction;
use acbp_core::{Mask, TupleError};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The record resolved but the validity function rejects it.
    Rejected,
    /// The category values do not resolve against the model.
    Malformed(TupleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidObservation {
    pub index: usize,
    pub mask: Mask,
    pub values: Vec<String>,
    pub reason: InvalidReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationAudit {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
    /// The first invalid records, up to the requested sample size.
    pub sample: Vec<InvalidObservation>,
}

/// Counts observed `(mask, values)` records the validity function accepts.
pub fn audit<R, S>(
    function: &ValidityFunction,
    observed: &[(Mask, R)],
    sample_size: usize,
) -> ObservationAudit
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let model = function.model();
    let mut result = ObservationAudit::default();
    for (index, (mask, values)) in observed.iter().enumerate() {
        let values = values.as_ref();
        result.total += 1;
        let reason = match model.resolve_tuple(values) {
            Ok(tuple) if function.is_valid(*mask, &tuple) => {
                result.valid += 1;
                continue;
            }
            Ok(_) => InvalidReason::Rejected,
            Err(err) => InvalidReason::Malformed(err),
        };
        result.invalid += 1;
        if result.sample.len() < sample_size {
            result.sample.push(InvalidObservation {
                index,
                mask: *mask,
                values: values.iter().map(|v| v.as_ref().to_string()).collect(),
                reason,
            });
        }
    }

    info!(
        event = "observation_audit",
        model = model.name(),
        total = result.total,
        valid = result.valid,
        invalid = result.invalid,
    );
    result
}
