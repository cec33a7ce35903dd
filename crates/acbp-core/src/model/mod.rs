//! Validated, immutable policy models.
//!
//! A [`Model`] is built once from a [`ModelDeclaration`] and never mutated;
//! a changed declaration produces a new edition. Loading checks the
//! structure of bits and categories and every bit reference made by rules.
//! Category references inside predicates are checked when the rules are
//! compiled.

mod declaration;


use std::collections::{HashMap, HashSet};

pub use declaration::{BitDeclaration, CategoryDeclaration, ModelDeclaration, RuleDeclaration};

use crate::error::{CompileError, TupleError};
use crate::mask::{self, Mask, MAX_WIDTH};
use crate::rule::Rule;
use crate::tuple::{CategoryTuple, TupleOdometer};

/// A named flag bound to one mask position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFlag {
    pub name: String,
    pub index: u8,
    pub doc: Option<String>,
}

impl BitFlag {
    pub fn mask(&self) -> Mask {
        mask::bit(self.index)
    }
}

/// A named, finite, ordered category domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDimension {
    name: String,
    values: Vec<String>,
    positions: HashMap<String, u32>,
}

impl CategoryDimension {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Domain position of `value`.
    pub fn position(&self, value: &str) -> Option<u32> {
        self.positions.get(value).copied()
    }

    pub fn value(&self, position: u32) -> Option<&str> {
        self.values.get(position as usize).map(String::as_str)
    }
}

/// A declared rule together with its resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub id: String,
    pub rule: Rule,
}

/// A validated model edition.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    width: u32,
    bits: Vec<BitFlag>,
    categories: Vec<CategoryDimension>,
    rules: Vec<RuleDef>,
    bit_lookup: HashMap<String, usize>,
    category_lookup: HashMap<String, usize>,
}

impl Model {
    /// Validates a declaration and builds the model.
    ///
    /// # Errors
    ///
    /// Returns the first structural or referential problem found; the
    /// declaration is rejected as a whole.
    pub fn load(decl: ModelDeclaration) -> Result<Self, CompileError> {
        let (bits, bit_lookup) = load_bits(&decl.bits)?;

        let max_index = bits.iter().map(|b| b.index as u32 + 1).max().unwrap_or(0);
        let width = decl.width.unwrap_or(max_index);
        if width > MAX_WIDTH {
            return Err(CompileError::WidthTooLarge { width });
        }
        if let Some(bit) = bits.iter().find(|b| b.index as u32 >= width) {
            return Err(CompileError::BitIndexOutOfRange {
                name: bit.name.clone(),
                index: bit.index as u32,
                width,
            });
        }

        let (categories, category_lookup) = load_categories(decl.categories)?;

        let mut model = Self {
            name: decl.name,
            width,
            bits,
            categories,
            rules: Vec::with_capacity(decl.rules.len()),
            bit_lookup,
            category_lookup,
        };
        model.rules = load_rules(&model, decl.rules)?;
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mask width B.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn bits(&self) -> &[BitFlag] {
        &self.bits
    }

    pub fn categories(&self) -> &[CategoryDimension] {
        &self.categories
    }

    pub fn rules(&self) -> &[RuleDef] {
        &self.rules
    }

    pub fn bit(&self, name: &str) -> Option<&BitFlag> {
        self.bit_lookup.get(name).map(|&i| &self.bits[i])
    }

    /// Resolves bit names to a mask, attributing failures to `rule_id`.
    pub fn resolve_bits<S: AsRef<str>>(
        &self,
        rule_id: &str,
        names: &[S],
    ) -> Result<Mask, CompileError> {
        names.iter().try_fold(0, |acc, name| {
            let name = name.as_ref();
            self.bit(name)
                .map(|b| acc | b.mask())
                .ok_or_else(|| CompileError::UnknownBit {
                    rule: rule_id.to_string(),
                    bit: name.to_string(),
                })
        })
    }

    /// Union of all declared flag bits.
    pub fn declared_mask(&self) -> Mask {
        self.bits.iter().fold(0, |acc, b| acc | b.mask())
    }

    /// Positions inside the width that no flag is declared on.
    pub fn reserved_mask(&self) -> Mask {
        mask::width_mask(self.width) & !self.declared_mask()
    }

    /// Looks up a dimension by name, returning its column position.
    pub fn category(&self, name: &str) -> Option<(usize, &CategoryDimension)> {
        self.category_lookup
            .get(name)
            .map(|&i| (i, &self.categories[i]))
    }

    /// Number of category tuples |C|, saturating.
    pub fn category_count(&self) -> u128 {
        self.categories
            .iter()
            .fold(1u128, |acc, c| acc.saturating_mul(c.len() as u128))
    }

    /// All category tuples in canonical order.
    pub fn tuples(&self) -> TupleOdometer {
        TupleOdometer::new(self.categories.iter().map(|c| c.len() as u32))
    }

    /// Resolves one value per dimension, in dimension order.
    pub fn resolve_tuple<S: AsRef<str>>(&self, values: &[S]) -> Result<CategoryTuple, TupleError> {
        if values.len() != self.categories.len() {
            return Err(TupleError::ArityMismatch {
                expected: self.categories.len(),
                actual: values.len(),
            });
        }
        self.categories
            .iter()
            .zip(values)
            .map(|(dim, value)| {
                let value = value.as_ref();
                dim.position(value).ok_or_else(|| TupleError::UnknownValue {
                    dimension: dim.name.clone(),
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<u32>, _>>()
            .map(CategoryTuple::from)
    }

    /// Checks that a tuple built elsewhere fits this model.
    pub fn check_tuple(&self, tuple: &CategoryTuple) -> Result<(), TupleError> {
        if tuple.len() != self.categories.len() {
            return Err(TupleError::ArityMismatch {
                expected: self.categories.len(),
                actual: tuple.len(),
            });
        }
        for (dim, &pos) in self.categories.iter().zip(tuple.as_slice()) {
            if pos as usize >= dim.len() {
                return Err(TupleError::IndexOutOfRange {
                    dimension: dim.name.clone(),
                    index: pos,
                });
            }
        }
        Ok(())
    }

    /// Renders a tuple back to its category values.
    pub fn tuple_values(&self, tuple: &CategoryTuple) -> Vec<&str> {
        self.categories
            .iter()
            .zip(tuple.as_slice())
            .map(|(dim, &pos)| dim.value(pos).unwrap_or("?"))
            .collect()
    }
}

fn load_bits(
    decls: &[BitDeclaration],
) -> Result<(Vec<BitFlag>, HashMap<String, usize>), CompileError> {
    let mut bits: Vec<BitFlag> = Vec::with_capacity(decls.len());
    let mut lookup = HashMap::with_capacity(decls.len());
    let mut by_index: HashMap<u8, usize> = HashMap::new();

    for (pos, decl) in decls.iter().enumerate() {
        let name = decl.name();
        let index = decl.index().unwrap_or(pos as u32);
        if index >= MAX_WIDTH {
            return Err(CompileError::BitIndexOutOfRange {
                name: name.to_string(),
                index,
                width: MAX_WIDTH,
            });
        }
        let index = index as u8;

        if lookup.insert(name.to_string(), bits.len()).is_some() {
            return Err(CompileError::DuplicateBit {
                name: name.to_string(),
            });
        }
        if let Some(&other) = by_index.get(&index) {
            return Err(CompileError::DuplicateBitIndex {
                index,
                first: bits[other].name.clone(),
                second: name.to_string(),
            });
        }
        by_index.insert(index, bits.len());
        bits.push(BitFlag {
            name: name.to_string(),
            index,
            doc: decl.doc().map(str::to_string),
        });
    }
    Ok((bits, lookup))
}

fn load_categories(
    decls: Vec<CategoryDeclaration>,
) -> Result<(Vec<CategoryDimension>, HashMap<String, usize>), CompileError> {
    let mut categories = Vec::with_capacity(decls.len());
    let mut lookup = HashMap::with_capacity(decls.len());

    for decl in decls {
        if lookup.contains_key(&decl.name) {
            return Err(CompileError::DuplicateCategory { name: decl.name });
        }
        if decl.values.is_empty() {
            return Err(CompileError::EmptyDomain {
                category: decl.name,
            });
        }
        let mut positions = HashMap::with_capacity(decl.values.len());
        for (pos, value) in decl.values.iter().enumerate() {
            if positions.insert(value.clone(), pos as u32).is_some() {
                return Err(CompileError::DuplicateValue {
                    category: decl.name,
                    value: value.clone(),
                });
            }
        }
        lookup.insert(decl.name.clone(), categories.len());
        categories.push(CategoryDimension {
            name: decl.name,
            values: decl.values,
            positions,
        });
    }
    Ok((categories, lookup))
}

fn load_rules(model: &Model, decls: Vec<RuleDeclaration>) -> Result<Vec<RuleDef>, CompileError> {
    let mut explicit: HashSet<&str> = HashSet::new();
    for id in decls.iter().filter_map(|d| d.id.as_deref()) {
        if !explicit.insert(id) {
            return Err(CompileError::DuplicateRuleId { id: id.to_string() });
        }
    }

    let mut taken: HashSet<String> = HashSet::with_capacity(decls.len());
    let mut rules: Vec<RuleDef> = Vec::with_capacity(decls.len());
    for (pos, decl) in decls.iter().enumerate() {
        let id = match &decl.id {
            Some(id) => id.clone(),
            None => {
                let described = decl.rule.describe();
                if explicit.contains(described.as_str()) || taken.contains(&described) {
                    format!("{described}#{pos}")
                } else {
                    described
                }
            }
        };

        check_rule_shape(&id, &decl.rule)?;
        model.resolve_bits(&id, &decl.rule.bit_names())?;
        taken.insert(id.clone());
        rules.push(RuleDef {
            id,
            rule: decl.rule.clone(),
        });
    }
    Ok(rules)
}

fn check_rule_shape(id: &str, rule: &Rule) -> Result<(), CompileError> {
    let empty = |field: &'static str| CompileError::EmptyBitSet {
        rule: id.to_string(),
        field,
    };
    match rule {
        Rule::BitForbid { forbid_when, .. } if forbid_when.is_empty() => Err(empty("forbid_when")),
        Rule::Implies { when_bits, .. } if when_bits.is_empty() => Err(empty("when_bits")),
        Rule::OneOf { bits } if bits.is_empty() => Err(empty("bits")),
        Rule::Mutex { a, b } | Rule::Equiv { a, b } if a == b => Err(CompileError::SelfPairedBit {
            rule: id.to_string(),
            bit: a.clone(),
        }),
        _ => Ok(()),
    }
}
