//! Per-rule clause compilation.

use std::fmt;

use acbp_core::mask::contains_all;
use acbp_core::{CategoryTuple, CompileError, Mask, Model, Predicate, Rule, RuleDef, RuleKind};

use crate::predicate::CompiledPredicate;
use crate::types::ClauseTest;

/// Resolved structure of a clause.
///
/// Bits are resolved to masks. Predicates are reduced to their constant
/// value, `None` when the clause depends on the category tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseShape {
    BitForbid { forbid: Mask, predicate: Option<bool> },
    CatForbid { predicate: Option<bool> },
    Implies { when: Mask, require_bits: Mask, require: Option<bool> },
    Mutex { a: Mask, b: Mask },
    Equiv { a: Mask, b: Mask },
    OneOf { bits: Mask },
    ReservedBits { reserved: Mask },
}

impl ClauseShape {
    pub fn is_category_dependent(&self) -> bool {
        match self {
            ClauseShape::BitForbid { predicate, .. } | ClauseShape::CatForbid { predicate } => {
                predicate.is_none()
            }
            ClauseShape::Implies { require, .. } => require.is_none(),
            _ => false,
        }
    }

    /// Bit-only relaxation of the clause.
    ///
    /// `Some(false)` means no tuple can make `mask` pass; `None` means the
    /// clause says nothing about masks alone. For clauses that are not
    /// category-dependent the answer is exact.
    pub fn relax(&self, mask: Mask) -> Option<bool> {
        match *self {
            ClauseShape::BitForbid { forbid, predicate } => match predicate? {
                true => Some(!contains_all(mask, forbid)),
                false => Some(true),
            },
            ClauseShape::CatForbid { predicate } => predicate.map(|p| !p),
            ClauseShape::Implies {
                when,
                require_bits,
                require,
            } => match require {
                Some(false) => Some(!contains_all(mask, when)),
                None if require_bits == 0 => None,
                _ => Some(!contains_all(mask, when) || contains_all(mask, require_bits)),
            },
            ClauseShape::Mutex { a, b } => Some(!contains_all(mask, a | b)),
            ClauseShape::Equiv { a, b } => Some((mask & a == 0) == (mask & b == 0)),
            ClauseShape::OneOf { bits } => Some((mask & bits).count_ones() == 1),
            ClauseShape::ReservedBits { reserved } => Some(mask & reserved == 0),
        }
    }
}

/// One compiled rule.
pub struct Clause {
    rule_id: String,
    kind: RuleKind,
    shape: ClauseShape,
    test: ClauseTest,
}

impl Clause {
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn shape(&self) -> ClauseShape {
        self.shape
    }

    pub fn is_category_dependent(&self) -> bool {
        self.shape.is_category_dependent()
    }

    #[inline]
    pub fn eval(&self, mask: Mask, tuple: &CategoryTuple) -> bool {
        (self.test)(mask, tuple)
    }

    #[inline]
    pub fn relax(&self, mask: Mask) -> Option<bool> {
        self.shape.relax(mask)
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("rule_id", &self.rule_id)
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Compiles one declared rule into its clause.
pub(crate) fn compile_rule(model: &Model, def: &RuleDef) -> Result<Clause, CompileError> {
    let id = def.id.as_str();
    match &def.rule {
        Rule::BitForbid {
            forbid_when,
            predicate,
        } => compile_bit_forbid(model, id, forbid_when, predicate),
        Rule::CatForbid { predicate } => compile_cat_forbid(model, id, predicate),
        Rule::Implies {
            when_bits,
            require_bits,
            require,
        } => compile_implies(model, id, when_bits, require_bits, require),
        Rule::Mutex { a, b } => {
            let shape = ClauseShape::Mutex {
                a: model.resolve_bits(id, &[a])?,
                b: model.resolve_bits(id, &[b])?,
            };
            Ok(bit_clause(id, RuleKind::Mutex, shape))
        }
        Rule::Equiv { a, b } => {
            let shape = ClauseShape::Equiv {
                a: model.resolve_bits(id, &[a])?,
                b: model.resolve_bits(id, &[b])?,
            };
            Ok(bit_clause(id, RuleKind::Equiv, shape))
        }
        Rule::OneOf { bits } => {
            let shape = ClauseShape::OneOf {
                bits: model.resolve_bits(id, bits)?,
            };
            Ok(bit_clause(id, RuleKind::OneOf, shape))
        }
    }
}

/// Clause keeping undeclared positions inside the width clear.
pub(crate) fn reserved_bits_clause(model: &Model) -> Option<Clause> {
    let reserved = model.reserved_mask();
    (reserved != 0).then(|| {
        bit_clause(
            "reserved_bits",
            RuleKind::ReservedBits,
            ClauseShape::ReservedBits { reserved },
        )
    })
}

fn compile_bit_forbid(
    model: &Model,
    id: &str,
    forbid_when: &[String],
    predicate: &Predicate,
) -> Result<Clause, CompileError> {
    let forbid = model.resolve_bits(id, forbid_when)?;
    let predicate = CompiledPredicate::compile(model, predicate)?;
    let shape = ClauseShape::BitForbid {
        forbid,
        predicate: predicate.constant(),
    };
    if !shape.is_category_dependent() {
        return Ok(bit_clause(id, RuleKind::BitForbid, shape));
    }

    let p = predicate.into_test();
    Ok(Clause {
        rule_id: id.to_string(),
        kind: RuleKind::BitForbid,
        shape,
        test: Box::new(move |mask, tuple| !(contains_all(mask, forbid) && p(tuple))),
    })
}

fn compile_cat_forbid(
    model: &Model,
    id: &str,
    predicate: &Predicate,
) -> Result<Clause, CompileError> {
    let predicate = CompiledPredicate::compile(model, predicate)?;
    let shape = ClauseShape::CatForbid {
        predicate: predicate.constant(),
    };
    if !shape.is_category_dependent() {
        return Ok(bit_clause(id, RuleKind::CatForbid, shape));
    }

    let p = predicate.into_test();
    Ok(Clause {
        rule_id: id.to_string(),
        kind: RuleKind::CatForbid,
        shape,
        test: Box::new(move |_, tuple| !p(tuple)),
    })
}

fn compile_implies(
    model: &Model,
    id: &str,
    when_bits: &[String],
    require_bits: &[String],
    require: &Predicate,
) -> Result<Clause, CompileError> {
    let when = model.resolve_bits(id, when_bits)?;
    let require_bits = model.resolve_bits(id, require_bits)?;
    let require = CompiledPredicate::compile(model, require)?;
    let shape = ClauseShape::Implies {
        when,
        require_bits,
        require: require.constant(),
    };
    if !shape.is_category_dependent() {
        return Ok(bit_clause(id, RuleKind::Implies, shape));
    }

    let q = require.into_test();
    Ok(Clause {
        rule_id: id.to_string(),
        kind: RuleKind::Implies,
        shape,
        test: Box::new(move |mask, tuple| {
            !contains_all(mask, when) || (contains_all(mask, require_bits) && q(tuple))
        }),
    })
}

/// Clause whose value depends on the mask only.
fn bit_clause(id: &str, kind: RuleKind, shape: ClauseShape) -> Clause {
    Clause {
        rule_id: id.to_string(),
        kind,
        shape,
        test: Box::new(move |mask, _| shape.relax(mask).unwrap_or(true)),
    }
}
