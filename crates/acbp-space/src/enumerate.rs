//! Decision-space enumeration.
//!
//! Rows come out ordered by mask ascending, then by category tuple in
//! declared domain order. Candidate masks are taken from the reduction
//! plan, so enumeration cost follows B_eff rather than B.

use std::sync::Arc;

use acbp_compiler::ValidityFunction;
use acbp_config::EnumerationThreads;
use acbp_core::{CategoryTuple, EnumerationBudgetExceeded, Mask, TupleOdometer};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analyze::ComplexityReport;

/// One member of the decision space, keyed by (mask, tuple).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionRow {
    pub mask: Mask,
    pub tuple: CategoryTuple,
}

impl DecisionRow {
    pub fn new(mask: Mask, tuple: CategoryTuple) -> Self {
        Self { mask, tuple }
    }
}

/// A materialized decision space in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionSpace {
    rows: Vec<DecisionRow>,
}

impl DecisionSpace {
    /// Wraps rows already in canonical order.
    pub(crate) fn from_sorted(rows: Vec<DecisionRow>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]));
        Self { rows }
    }

    pub fn rows(&self) -> &[DecisionRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DecisionRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecisionRow> {
        self.rows.iter()
    }

    pub fn contains(&self, mask: Mask, tuple: &CategoryTuple) -> bool {
        self.rows
            .binary_search_by(|row| (row.mask, &row.tuple).cmp(&(mask, tuple)))
            .is_ok()
    }

    /// Rows whose category tuple satisfies `keep`, order preserved.
    pub fn filter_tuples(&self, mut keep: impl FnMut(&CategoryTuple) -> bool) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|row| keep(&row.tuple))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DecisionSpace {
    type Item = &'a DecisionRow;
    type IntoIter = std::slice::Iter<'a, DecisionRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Enumerates the decision space of one compiled model.
///
/// Construction runs the guardrail; an `Enumerator` only exists for spaces
/// the configuration admits. It is restartable: every call to
/// [`Enumerator::rows`] starts from the first row.
#[derive(Debug, Clone)]
pub struct Enumerator {
    function: ValidityFunction,
    candidates: Arc<[Mask]>,
}

impl Enumerator {
    pub fn new(
        function: &ValidityFunction,
        report: &ComplexityReport,
    ) -> Result<Self, EnumerationBudgetExceeded> {
        report.check_guardrail()?;
        let candidates: Vec<Mask> = report
            .plan
            .candidates()
            .into_iter()
            .filter(|&m| function.is_valid_mask(m))
            .collect();
        debug!(
            event = "enumeration_candidates",
            candidates = candidates.len(),
            effective_bits = report.effective_bits,
        );
        Ok(Self {
            function: function.clone(),
            candidates: candidates.into(),
        })
    }

    /// Candidate masks that pass the bit-only relaxation, ascending.
    pub fn candidates(&self) -> &[Mask] {
        &self.candidates
    }

    /// Lazy iterator over the decision space in canonical order.
    pub fn rows(&self) -> DecisionRows<'_> {
        DecisionRows {
            function: &self.function,
            masks: self.candidates.iter(),
            current: None,
        }
    }

    /// Materializes the decision space.
    ///
    /// With parallel threads, candidates are split into contiguous shards
    /// and the shard results are concatenated in order, so the result is
    /// identical to serial enumeration.
    pub fn collect(&self, threads: EnumerationThreads) -> DecisionSpace {
        let rows = match threads {
            EnumerationThreads::None | EnumerationThreads::Count(1) => self.rows().collect(),
            EnumerationThreads::Auto => self.collect_sharded(rayon::current_num_threads()),
            EnumerationThreads::Count(n) => {
                match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                    Ok(pool) => pool.install(|| self.collect_sharded(n)),
                    Err(err) => {
                        warn!(
                            event = "thread_pool_unavailable",
                            threads = n,
                            error = %err,
                        );
                        self.rows().collect()
                    }
                }
            }
        };

        info!(
            event = "enumeration_end",
            model = self.function.model().name(),
            candidates = self.candidates.len(),
            rows = rows.len(),
        );
        DecisionSpace::from_sorted(rows)
    }

    fn collect_sharded(&self, workers: usize) -> Vec<DecisionRow> {
        let shard_len = self.candidates.len().div_ceil(workers.max(1) * 4).max(1);
        let shards: Vec<Vec<DecisionRow>> = self
            .candidates
            .par_chunks(shard_len)
            .map(|shard| {
                shard
                    .iter()
                    .flat_map(|&mask| rows_for_mask(&self.function, mask))
                    .collect()
            })
            .collect();
        shards.into_iter().flatten().collect()
    }
}

fn rows_for_mask(
    function: &ValidityFunction,
    mask: Mask,
) -> impl Iterator<Item = DecisionRow> + '_ {
    function
        .model()
        .tuples()
        .filter(move |t| function.is_valid(mask, t))
        .map(move |tuple| DecisionRow { mask, tuple })
}

/// Lazy decision-space iterator.
pub struct DecisionRows<'a> {
    function: &'a ValidityFunction,
    masks: std::slice::Iter<'a, Mask>,
    current: Option<(Mask, TupleOdometer)>,
}

impl Iterator for DecisionRows<'_> {
    type Item = DecisionRow;

    fn next(&mut self) -> Option<DecisionRow> {
        loop {
            if let Some((mask, tuples)) = self.current.as_mut() {
                let mask = *mask;
                if let Some(tuple) = tuples.find(|t| self.function.is_valid(mask, t)) {
                    return Some(DecisionRow { mask, tuple });
                }
            }
            let &mask = self.masks.next()?;
            self.current = Some((mask, self.function.model().tuples()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acbp_compiler::link;
    use acbp_config::{BitReduction, EngineConfig};
    use acbp_core::{Model, ModelDeclaration, Predicate, Rule};

    use super::*;
    use crate::analyze::analyze;

    fn setup(decl: ModelDeclaration, config: &EngineConfig) -> (ValidityFunction, Enumerator) {
        let f = link(Arc::new(Model::load(decl).unwrap())).unwrap();
        let report = analyze(&f, config);
        let e = Enumerator::new(&f, &report).unwrap();
        (f, e)
    }

    fn inpatient() -> ModelDeclaration {
        ModelDeclaration::new("inpatient")
            .with_flags(["admitted", "discharged", "in_icu"])
            .with_category("ward", ["Medical", "ICU"])
            .with_category("payer", ["Public", "Private"])
            .with_rule(Rule::mutex("admitted", "discharged"))
            .with_rule(Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical")))
    }

    /// Brute force over the full declared space.
    fn brute_force(f: &ValidityFunction) -> Vec<DecisionRow> {
        let width = f.model().width();
        (0..1u64 << width)
            .flat_map(|mask| rows_for_mask(f, mask).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_rows_are_sound_complete_and_ordered() {
        let (f, e) = setup(inpatient(), &EngineConfig::default());
        let rows: Vec<DecisionRow> = e.rows().collect();
        assert_eq!(rows, brute_force(&f));
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        // 3 masks without in_icu x 4 tuples + 3 masks with in_icu x 2 ICU tuples
        assert_eq!(rows.len(), 18);
    }

    #[test]
    fn test_rows_are_restartable() {
        let (_, e) = setup(inpatient(), &EngineConfig::default());
        let first: Vec<_> = e.rows().collect();
        let second: Vec<_> = e.rows().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (_, e) = setup(inpatient(), &EngineConfig::default());
        let serial = e.collect(EnumerationThreads::None);
        assert_eq!(e.collect(EnumerationThreads::Auto), serial);
        assert_eq!(e.collect(EnumerationThreads::Count(3)), serial);
    }

    #[test]
    fn test_reduction_preserves_space() {
        let decl = inpatient()
            .with_width(5)
            .with_flags(["mirror"])
            .with_rule(Rule::equiv("mirror", "admitted"));
        let off = EngineConfig::default().with_bit_reduction(BitReduction::Off);
        let (f, reduced) = setup(decl.clone(), &EngineConfig::default());
        let (_, full) = setup(decl, &off);
        assert_eq!(analyze(&f, &EngineConfig::default()).effective_bits, 3);
        assert_eq!(analyze(&f, &off).effective_bits, 5);
        assert_eq!(reduced.candidates(), full.candidates());
        assert_eq!(
            reduced.collect(EnumerationThreads::None),
            full.collect(EnumerationThreads::None)
        );
    }

    #[test]
    fn test_guardrail_blocks_construction() {
        let f = link(Arc::new(Model::load(inpatient()).unwrap())).unwrap();
        let report = analyze(&f, &EngineConfig::new().with_enumeration_limit_bits(2));
        assert!(Enumerator::new(&f, &report).is_err());
    }

    #[test]
    fn test_space_lookup() {
        let (f, e) = setup(inpatient(), &EngineConfig::default());
        let space = e.collect(EnumerationThreads::None);
        let icu = f.model().resolve_tuple(&["ICU", "Public"]).unwrap();
        let medical = f.model().resolve_tuple(&["Medical", "Public"]).unwrap();
        assert!(space.contains(0b100, &icu));
        assert!(!space.contains(0b100, &medical));
        assert!(!space.contains(0b011, &icu));
    }
}
