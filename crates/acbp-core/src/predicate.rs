//! Predicate trees over category tuples.
//!
//! Predicates are equality/membership tests on declared category
//! dimensions, combined with `All`, `Any` and `Not`. They are compiled into
//! closures by `acbp-compiler`; this module only holds the tree.
//!
//! # Declarative form
//!
//! In model documents a predicate is a map. Each key contributes one term
//! and all terms of one map are conjoined:
//!
//! ```
//! use acbp_core::Predicate;
//!
//! let p: Predicate = serde_json::from_str(
//!     r#"{ "ward": "Medical", "site": ["Main", "Annex"] }"#,
//! ).unwrap();
//!
//! assert_eq!(
//!     p,
//!     Predicate::all(vec![
//!         Predicate::eq("ward", "Medical"),
//!         Predicate::is_in("site", ["Main", "Annex"]),
//!     ])
//! );
//! ```
//!
//! Operator keys are `all`, `any`, `not`, `eq`, `ne`, `in` and `not_in`;
//! any other key is a category name (a string value means `Eq`, a list means
//! `In`). A category literally named like an operator must use the explicit
//! `eq`/`in` forms.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Not;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

/// A predicate over one category tuple.
///
/// `All(vec![])` is true and `Any(vec![])` is false (the Boolean monoid
/// identities). `Default` is the always-true predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Eq { field: String, value: String },
    NotEq { field: String, value: String },
    In { field: String, values: Vec<String> },
    NotIn { field: String, values: Vec<String> },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::NotEq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Predicate::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Predicate::NotIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all(terms: Vec<Predicate>) -> Self {
        Predicate::All(terms)
    }

    pub fn any(terms: Vec<Predicate>) -> Self {
        Predicate::Any(terms)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    /// The always-true predicate, `All([])`.
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    /// The always-false predicate, `Any([])`.
    pub fn never() -> Self {
        Predicate::Any(Vec::new())
    }

    /// Names of every category this predicate mentions, in first-use order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Eq { field, .. }
            | Predicate::NotEq { field, .. }
            | Predicate::In { field, .. }
            | Predicate::NotIn { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field.as_str());
                }
            }
            Predicate::All(terms) | Predicate::Any(terms) => {
                for term in terms {
                    term.collect_fields(out);
                }
            }
            Predicate::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::always()
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Predicate::Not(Box::new(self))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, op: &str, terms: &[Predicate]) -> fmt::Result {
            write!(f, "{op}(")?;
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{term}")?;
            }
            f.write_str(")")
        }

        match self {
            Predicate::Eq { field, value } => write!(f, "{field}={value}"),
            Predicate::NotEq { field, value } => write!(f, "{field}!={value}"),
            Predicate::In { field, values } => write!(f, "{field}={{{}}}", values.join("|")),
            Predicate::NotIn { field, values } => write!(f, "{field}!={{{}}}", values.join("|")),
            Predicate::All(terms) if terms.is_empty() => f.write_str("true"),
            Predicate::Any(terms) if terms.is_empty() => f.write_str("false"),
            Predicate::All(terms) => join(f, "all", terms),
            Predicate::Any(terms) => join(f, "any", terms),
            Predicate::Not(inner) => write!(f, "not({inner})"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldValue {
    One(String),
    Many(Vec<String>),
}

struct PredicateVisitor;

impl<'de> Visitor<'de> for PredicateVisitor {
    type Value = Predicate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a predicate map or a list of predicate maps")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Predicate, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut terms = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "all" => terms.push(Predicate::All(map.next_value()?)),
                "any" => terms.push(Predicate::Any(map.next_value()?)),
                "not" => terms.push(Predicate::not(map.next_value()?)),
                "eq" => {
                    let pairs: BTreeMap<String, String> = map.next_value()?;
                    terms.extend(pairs.into_iter().map(|(f, v)| Predicate::eq(f, v)));
                }
                "ne" => {
                    let pairs: BTreeMap<String, String> = map.next_value()?;
                    terms.extend(pairs.into_iter().map(|(f, v)| Predicate::not_eq(f, v)));
                }
                "in" => {
                    let sets: BTreeMap<String, Vec<String>> = map.next_value()?;
                    terms.extend(sets.into_iter().map(|(f, v)| Predicate::is_in(f, v)));
                }
                "not_in" => {
                    let sets: BTreeMap<String, Vec<String>> = map.next_value()?;
                    terms.extend(sets.into_iter().map(|(f, v)| Predicate::not_in(f, v)));
                }
                _ => match map.next_value::<FieldValue>()? {
                    FieldValue::One(value) => terms.push(Predicate::eq(key, value)),
                    FieldValue::Many(values) => terms.push(Predicate::is_in(key, values)),
                },
            }
        }

        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Predicate::All(terms))
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Predicate, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut terms = Vec::new();
        while let Some(term) = seq.next_element::<Predicate>()? {
            terms.push(term);
        }
        Ok(Predicate::All(terms))
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PredicateVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Predicate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_field_shorthand() {
        assert_eq!(parse(r#"{"ward": "Medical"}"#), Predicate::eq("ward", "Medical"));
        assert_eq!(
            parse(r#"{"ward": ["Medical", "ICU"]}"#),
            Predicate::is_in("ward", ["Medical", "ICU"])
        );
    }

    #[test]
    fn test_multiple_keys_are_conjoined() {
        let p = parse(r#"{"ward": "Medical", "not": {"site": "Annex"}}"#);
        assert_eq!(
            p,
            Predicate::all(vec![
                Predicate::eq("ward", "Medical"),
                Predicate::not(Predicate::eq("site", "Annex")),
            ])
        );
    }

    #[test]
    fn test_operator_keys() {
        let p = parse(
            r#"{"any": [{"eq": {"ward": "ICU"}}, {"not_in": {"site": ["Main"]}}],
                "ne": {"payer": "SelfPay"}}"#,
        );
        assert_eq!(
            p,
            Predicate::all(vec![
                Predicate::any(vec![
                    Predicate::eq("ward", "ICU"),
                    Predicate::not_in("site", ["Main"]),
                ]),
                Predicate::not_eq("payer", "SelfPay"),
            ])
        );
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(parse("{}"), Predicate::always());
        assert_eq!(parse(r#"{"any": []}"#), Predicate::never());
        assert_eq!(parse("[]"), Predicate::always());
        assert_eq!(Predicate::default(), Predicate::always());
    }

    #[test]
    fn test_not_operator_and_display() {
        let p = !Predicate::is_in("ward", ["Medical", "ICU"]);
        assert_eq!(p.to_string(), "not(ward={Medical|ICU})");
        assert_eq!(Predicate::always().to_string(), "true");
        assert_eq!(Predicate::never().to_string(), "false");
    }

    #[test]
    fn test_fields_in_first_use_order() {
        let p = Predicate::any(vec![
            Predicate::eq("site", "Main"),
            Predicate::not(Predicate::eq("ward", "ICU")),
            Predicate::is_in("site", ["Annex"]),
        ]);
        assert_eq!(p.fields(), vec!["site", "ward"]);
    }
}
