//! Rule declarations.
//!
//! Rules are a closed set of shapes. Each one is compiled into a single
//! clause by `acbp-compiler`; the composite validity function is the
//! conjunction of all clauses.

use std::fmt;

use serde::Deserialize;

use crate::predicate::Predicate;

/// A declared rule over flag bits and category predicates.
///
/// Bits are referenced by name and resolved against the model at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Forbids the combination "all `forbid_when` bits set and `predicate`
    /// holds".
    BitForbid {
        forbid_when: Vec<String>,
        #[serde(default)]
        predicate: Predicate,
    },

    /// Forbids every category tuple matching `predicate`, whatever the mask.
    CatForbid { predicate: Predicate },

    /// When all `when_bits` are set, all `require_bits` must be set and
    /// `require` must hold.
    ///
    /// `Implies { B, [], Q }` accepts exactly what `BitForbid { B, not(Q) }`
    /// accepts.
    Implies {
        when_bits: Vec<String>,
        #[serde(default)]
        require_bits: Vec<String>,
        #[serde(default)]
        require: Predicate,
    },

    /// The two bits are never set together.
    Mutex { a: String, b: String },

    /// The two bits are always equal.
    Equiv { a: String, b: String },

    /// Exactly one of the bits is set.
    OneOf { bits: Vec<String> },
}

/// Shape tag of a compiled clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    BitForbid,
    CatForbid,
    Implies,
    Mutex,
    Equiv,
    OneOf,
    /// Implicit clause keeping undeclared bit positions clear.
    ReservedBits,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::BitForbid => "bit_forbid",
            RuleKind::CatForbid => "cat_forbid",
            RuleKind::Implies => "implies",
            RuleKind::Mutex => "mutex",
            RuleKind::Equiv => "equiv",
            RuleKind::OneOf => "one_of",
            RuleKind::ReservedBits => "reserved_bits",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Rule {
    pub fn bit_forbid<I, S>(forbid_when: I, predicate: Predicate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::BitForbid {
            forbid_when: names(forbid_when),
            predicate,
        }
    }

    pub fn cat_forbid(predicate: Predicate) -> Self {
        Rule::CatForbid { predicate }
    }

    /// Bits-to-category implication: `when_bits` set ⇒ `require` holds.
    pub fn implies<I, S>(when_bits: I, require: Predicate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Implies {
            when_bits: names(when_bits),
            require_bits: Vec::new(),
            require,
        }
    }

    /// Bit-to-bit implication: `when` set ⇒ `then` set.
    pub fn bit_implies(when: impl Into<String>, then: impl Into<String>) -> Self {
        Rule::Implies {
            when_bits: vec![when.into()],
            require_bits: vec![then.into()],
            require: Predicate::always(),
        }
    }

    pub fn mutex(a: impl Into<String>, b: impl Into<String>) -> Self {
        Rule::Mutex {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn equiv(a: impl Into<String>, b: impl Into<String>) -> Self {
        Rule::Equiv {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn one_of<I, S>(bits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::OneOf { bits: names(bits) }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::BitForbid { .. } => RuleKind::BitForbid,
            Rule::CatForbid { .. } => RuleKind::CatForbid,
            Rule::Implies { .. } => RuleKind::Implies,
            Rule::Mutex { .. } => RuleKind::Mutex,
            Rule::Equiv { .. } => RuleKind::Equiv,
            Rule::OneOf { .. } => RuleKind::OneOf,
        }
    }

    /// Every bit name this rule references, in declaration order.
    pub fn bit_names(&self) -> Vec<&str> {
        match self {
            Rule::BitForbid { forbid_when, .. } => forbid_when.iter().map(String::as_str).collect(),
            Rule::CatForbid { .. } => Vec::new(),
            Rule::Implies {
                when_bits,
                require_bits,
                ..
            } => when_bits
                .iter()
                .chain(require_bits.iter())
                .map(String::as_str)
                .collect(),
            Rule::Mutex { a, b } | Rule::Equiv { a, b } => vec![a.as_str(), b.as_str()],
            Rule::OneOf { bits } => bits.iter().map(String::as_str).collect(),
        }
    }

    /// Human-readable identifier used when a declaration carries no id.
    pub fn describe(&self) -> String {
        match self {
            Rule::BitForbid {
                forbid_when,
                predicate,
            } => format!("bit_forbid({} when {})", forbid_when.join("&"), predicate),
            Rule::CatForbid { predicate } => format!("cat_forbid({predicate})"),
            Rule::Implies {
                when_bits,
                require_bits,
                require,
            } => {
                let mut then = require_bits.join("&");
                if *require != Predicate::always() || then.is_empty() {
                    if !then.is_empty() {
                        then.push_str(" & ");
                    }
                    then.push_str(&require.to_string());
                }
                format!("implies({} -> {})", when_bits.join("&"), then)
            }
            Rule::Mutex { a, b } => format!("mutex({a}, {b})"),
            Rule::Equiv { a, b } => format!("equiv({a}, {b})"),
            Rule::OneOf { bits } => format!("one_of({})", bits.join(", ")),
        }
    }
}

fn names<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(
            Rule::bit_implies("checked_in", "booked").describe(),
            "implies(checked_in -> booked)"
        );
        assert_eq!(
            Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical")).describe(),
            "bit_forbid(in_icu when ward=Medical)"
        );
        assert_eq!(
            Rule::implies(["in_icu"], Predicate::eq("ward", "ICU")).describe(),
            "implies(in_icu -> ward=ICU)"
        );
        assert_eq!(Rule::mutex("discharged", "expired").describe(), "mutex(discharged, expired)");
    }

    #[test]
    fn test_bit_names() {
        let rule = Rule::Implies {
            when_bits: vec!["a".into(), "b".into()],
            require_bits: vec!["c".into()],
            require: Predicate::always(),
        };
        assert_eq!(rule.bit_names(), vec!["a", "b", "c"]);
        assert!(Rule::cat_forbid(Predicate::always()).bit_names().is_empty());
    }

    #[test]
    fn test_tagged_deserialize() {
        let rule: Rule = serde_json::from_str(
            r#"{"type": "bit_forbid", "forbid_when": ["in_icu"], "predicate": {"ward": "Medical"}}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            Rule::bit_forbid(["in_icu"], Predicate::eq("ward", "Medical"))
        );

        let rule: Rule = serde_json::from_str(
            r#"{"type": "implies", "when_bits": ["checked_in"], "require_bits": ["booked"]}"#,
        )
        .unwrap();
        assert_eq!(rule, Rule::bit_implies("checked_in", "booked"));
        assert_eq!(rule.kind(), RuleKind::Implies);
    }
}
