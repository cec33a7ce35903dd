//! Predicate compilation.
//!
//! A [`Predicate`] tree is compiled once per model into a boxed closure over
//! [`CategoryTuple`]. Every field and literal is resolved against the model
//! up front, so evaluation is a table lookup per leaf. Subtrees whose value
//! does not depend on the tuple are folded to constants.


use std::fmt;

use acbp_core::{CategoryTuple, CompileError, Model, Predicate};

use crate::types::TupleTest;

/// A predicate resolved against one model.
pub struct CompiledPredicate {
    source: Predicate,
    constant: Option<bool>,
    test: TupleTest,
}

impl CompiledPredicate {
    /// Compiles `predicate` against `model`.
    ///
    /// # Errors
    ///
    /// Fails on an undeclared category, a literal outside its domain, or a
    /// membership test with no values. Constant subtrees are still checked.
    pub fn compile(model: &Model, predicate: &Predicate) -> Result<Self, CompileError> {
        let node = compile_node(model, predicate)?;
        Ok(Self {
            source: predicate.clone(),
            constant: node.constant,
            test: node.test,
        })
    }

    #[inline]
    pub fn eval(&self, tuple: &CategoryTuple) -> bool {
        (self.test)(tuple)
    }

    /// Value of the predicate when it is independent of the tuple.
    pub fn constant(&self) -> Option<bool> {
        self.constant
    }

    pub fn source(&self) -> &Predicate {
        &self.source
    }

    pub fn into_test(self) -> TupleTest {
        self.test
    }
}

impl fmt::Debug for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("source", &self.source.to_string())
            .field("constant", &self.constant)
            .finish()
    }
}

struct Node {
    constant: Option<bool>,
    test: TupleTest,
}

impl Node {
    fn constant(value: bool) -> Self {
        Self {
            constant: Some(value),
            test: Box::new(move |_| value),
        }
    }

    fn dynamic(test: TupleTest) -> Self {
        Self {
            constant: None,
            test,
        }
    }
}

fn compile_node(model: &Model, predicate: &Predicate) -> Result<Node, CompileError> {
    match predicate {
        Predicate::Eq { field, value } => {
            membership(model, field, std::slice::from_ref(value), false)
        }
        Predicate::NotEq { field, value } => {
            membership(model, field, std::slice::from_ref(value), true)
        }
        Predicate::In { field, values } => membership(model, field, values, false),
        Predicate::NotIn { field, values } => membership(model, field, values, true),
        Predicate::All(terms) => junction(model, terms, true),
        Predicate::Any(terms) => junction(model, terms, false),
        Predicate::Not(inner) => {
            let inner = compile_node(model, inner)?;
            Ok(match inner.constant {
                Some(value) => Node::constant(!value),
                None => {
                    let test = inner.test;
                    Node::dynamic(Box::new(move |t| !test(t)))
                }
            })
        }
    }
}

/// Builds a membership table over the field's domain.
fn membership(
    model: &Model,
    field: &str,
    values: &[String],
    negate: bool,
) -> Result<Node, CompileError> {
    let (dim, category) = model
        .category(field)
        .ok_or_else(|| CompileError::UnknownField {
            field: field.to_string(),
        })?;
    if values.is_empty() {
        return Err(CompileError::EmptyValueSet {
            field: field.to_string(),
        });
    }

    let mut table = vec![negate; category.len()];
    for value in values {
        let pos = category
            .position(value)
            .ok_or_else(|| CompileError::UnknownValue {
                field: field.to_string(),
                value: value.clone(),
            })?;
        table[pos as usize] = !negate;
    }

    if table.iter().all(|&hit| hit) {
        return Ok(Node::constant(true));
    }
    if table.iter().all(|&hit| !hit) {
        return Ok(Node::constant(false));
    }
    Ok(Node::dynamic(Box::new(move |t| {
        t.get(dim)
            .and_then(|pos| table.get(pos as usize).copied())
            .unwrap_or(false)
    })))
}

/// Conjunction (`conjoin = true`) or disjunction of `terms`.
///
/// The identity element is dropped and the absorbing element folds the
/// whole junction.
fn junction(model: &Model, terms: &[Predicate], conjoin: bool) -> Result<Node, CompileError> {
    let mut tests: Vec<TupleTest> = Vec::with_capacity(terms.len());
    let mut absorbed = false;
    for term in terms {
        let node = compile_node(model, term)?;
        match node.constant {
            Some(value) if value == conjoin => {}
            Some(_) => absorbed = true,
            None => tests.push(node.test),
        }
    }

    if absorbed {
        return Ok(Node::constant(!conjoin));
    }
    match tests.len() {
        0 => Ok(Node::constant(conjoin)),
        1 => Ok(Node::dynamic(tests.remove(0))),
        _ if conjoin => Ok(Node::dynamic(Box::new(move |t| tests.iter().all(|f| f(t))))),
        _ => Ok(Node::dynamic(Box::new(move |t| tests.iter().any(|f| f(t))))),
    }
}
