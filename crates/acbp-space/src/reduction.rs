//! Proven bit reductions.
//!
//! A reduction is only applied when the clause set proves it for every
//! category tuple: a bit whose value is forced, or a set of bits forced to
//! be equal. Every valid mask stays among the candidates the plan
//! generates.

use acbp_compiler::{ClauseShape, ValidityFunction};
use acbp_config::BitReduction;
use acbp_core::mask::{self, Mask};

/// Candidate-mask plan over the declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionPlan {
    /// Bits proven clear in every valid mask.
    pub fixed_zero: Mask,
    /// Bits proven set in every valid mask.
    pub fixed_one: Mask,
    /// Free degrees of freedom; each class toggles all of its bits together.
    pub classes: Vec<Mask>,
    /// Some class is forced both set and clear: no mask is valid.
    pub infeasible: bool,
}

impl ReductionPlan {
    /// The unreduced plan: every position in the width is free.
    pub fn full(width: u32) -> Self {
        Self {
            fixed_zero: 0,
            fixed_one: 0,
            classes: (0..width.min(mask::MAX_WIDTH))
                .map(|i| mask::bit(i as u8))
                .collect(),
            infeasible: false,
        }
    }

    pub fn derive(function: &ValidityFunction, mode: BitReduction) -> Self {
        let width = function.model().width();
        if mode == BitReduction::Off {
            return Self::full(width);
        }

        let mut fixed_zero: Mask = 0;
        let mut fixed_one: Mask = 0;
        let mut classes = UnionFind::new(width as usize);
        let mut implications: Vec<(u8, u8)> = Vec::new();

        for clause in function.clauses() {
            match clause.shape() {
                ClauseShape::ReservedBits { reserved } => fixed_zero |= reserved,
                ClauseShape::BitForbid {
                    forbid,
                    predicate: Some(true),
                } if forbid.count_ones() == 1 => fixed_zero |= forbid,
                ClauseShape::Implies {
                    when,
                    require: Some(false),
                    ..
                } if when.count_ones() == 1 => fixed_zero |= when,
                ClauseShape::Implies {
                    when,
                    require_bits,
                    require: Some(true),
                } if when.count_ones() == 1 && require_bits.count_ones() == 1 => {
                    implications.push((low_bit(when), low_bit(require_bits)));
                }
                ClauseShape::OneOf { bits } if bits.count_ones() == 1 => fixed_one |= bits,
                ClauseShape::Equiv { a, b } => classes.union(low_bit(a), low_bit(b)),
                _ => {}
            }
        }

        for &(a, b) in &implications {
            if implications.contains(&(b, a)) {
                classes.union(a, b);
            }
        }

        let mut plan = Self {
            fixed_zero: 0,
            fixed_one: 0,
            classes: Vec::new(),
            infeasible: false,
        };
        for class in classes.into_classes() {
            let zero = class & fixed_zero != 0;
            let one = class & fixed_one != 0;
            match (zero, one) {
                (true, true) => {
                    plan.infeasible = true;
                    plan.fixed_zero |= class;
                }
                (true, false) => plan.fixed_zero |= class,
                (false, true) => plan.fixed_one |= class,
                (false, false) => plan.classes.push(class),
            }
        }
        plan
    }

    /// B_eff: number of free degrees of freedom.
    pub fn effective_bits(&self) -> u32 {
        self.classes.len() as u32
    }

    /// Number of candidate masks, zero when infeasible.
    pub fn candidate_count(&self) -> u128 {
        if self.infeasible {
            0
        } else {
            1u128 << self.effective_bits()
        }
    }

    /// Expands the `i`-th assignment of the free classes into a full mask.
    pub fn expand(&self, i: u64) -> Mask {
        self.classes
            .iter()
            .enumerate()
            .filter(|&(j, _)| (i >> j) & 1 == 1)
            .fold(self.fixed_one, |acc, (_, &class)| acc | class)
    }

    /// All candidate masks, ascending.
    ///
    /// Callers must check the guardrail first; the result has
    /// `2^effective_bits` entries.
    pub fn candidates(&self) -> Vec<Mask> {
        if self.infeasible {
            return Vec::new();
        }
        let count = 1u64.checked_shl(self.effective_bits()).unwrap_or(0);
        let mut masks: Vec<Mask> = (0..count).map(|i| self.expand(i)).collect();
        masks.sort_unstable();
        masks
    }
}

fn low_bit(mask: Mask) -> u8 {
    mask.trailing_zeros() as u8
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: u8, b: u8) {
        let (ra, rb) = (self.find(a as usize), self.find(b as usize));
        if ra != rb {
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }

    /// Classes as masks, ordered by lowest member.
    fn into_classes(mut self) -> Vec<Mask> {
        let n = self.parent.len();
        let mut by_root = vec![0 as Mask; n];
        for i in 0..n {
            let root = self.find(i);
            by_root[root] |= mask::bit(i as u8);
        }
        by_root.into_iter().filter(|&m| m != 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acbp_compiler::link;
    use acbp_core::{Model, ModelDeclaration, Predicate, Rule};

    use super::*;

    fn plan(decl: ModelDeclaration) -> ReductionPlan {
        let f = link(Arc::new(Model::load(decl).unwrap())).unwrap();
        ReductionPlan::derive(&f, BitReduction::Proven)
    }

    #[test]
    fn test_unreduced_plan() {
        let p = ReductionPlan::full(3);
        assert_eq!(p.effective_bits(), 3);
        assert_eq!(p.candidates(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_fixed_bits() {
        let p = plan(
            ModelDeclaration::new("m")
                .with_width(5)
                .with_flags(["a", "b", "c", "d"])
                .with_rule(Rule::bit_forbid(["b"], Predicate::always()))
                .with_rule(Rule::one_of(["c"])),
        );
        assert_eq!(p.fixed_zero, 0b10010);
        assert_eq!(p.fixed_one, 0b00100);
        assert_eq!(p.effective_bits(), 2);
        assert_eq!(p.candidates(), vec![0b00100, 0b00101, 0b01100, 0b01101]);
    }

    #[test]
    fn test_equivalence_classes() {
        let p = plan(
            ModelDeclaration::new("m")
                .with_flags(["a", "b", "c", "d"])
                .with_rule(Rule::equiv("a", "c"))
                .with_rule(Rule::bit_implies("b", "d"))
                .with_rule(Rule::bit_implies("d", "b")),
        );
        assert_eq!(p.classes, vec![0b0101, 0b1010]);
        assert_eq!(p.candidates(), vec![0, 0b0101, 0b1010, 0b1111]);
    }

    #[test]
    fn test_one_way_implication_is_not_collapsed() {
        let p = plan(
            ModelDeclaration::new("m")
                .with_flags(["booked", "checked_in"])
                .with_rule(Rule::bit_implies("checked_in", "booked")),
        );
        assert_eq!(p.effective_bits(), 2);
    }

    #[test]
    fn test_category_dependent_rules_do_not_reduce() {
        let p = plan(
            ModelDeclaration::new("m")
                .with_flags(["in_icu"])
                .with_category("ward", ["Medical", "ICU"])
                .with_rule(Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical"))),
        );
        assert_eq!(p.effective_bits(), 1);
    }

    #[test]
    fn test_conflicting_class_is_infeasible() {
        let p = plan(
            ModelDeclaration::new("m")
                .with_flags(["a", "b"])
                .with_rule(Rule::equiv("a", "b"))
                .with_rule(Rule::one_of(["a"]))
                .with_rule(Rule::bit_forbid(["b"], Predicate::always())),
        );
        assert!(p.infeasible);
        assert_eq!(p.candidate_count(), 0);
        assert!(p.candidates().is_empty());
    }
}
