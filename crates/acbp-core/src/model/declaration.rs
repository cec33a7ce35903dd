//! Declarative model tree, as parsed from a model document.

use std::fmt;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::rule::Rule;

/// Unvalidated model declaration.
///
/// Accepts both the list form of categories and the map form
/// (`{"ward": ["Medical", "ICU"]}`); with the map form, dimension order is
/// the document's key order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDeclaration {
    pub name: String,

    /// Mask width in bits. Defaults to the highest bit index plus one.
    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default, alias = "flags")]
    pub bits: Vec<BitDeclaration>,

    #[serde(default, deserialize_with = "ordered_categories")]
    pub categories: Vec<CategoryDeclaration>,

    #[serde(default, alias = "constraints")]
    pub rules: Vec<RuleDeclaration>,
}

/// A flag declaration: either a bare name (index = list position) or a
/// full record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BitDeclaration {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        index: Option<u32>,
        #[serde(default)]
        doc: Option<String>,
    },
}

impl BitDeclaration {
    pub fn name(&self) -> &str {
        match self {
            BitDeclaration::Name(name) | BitDeclaration::Full { name, .. } => name,
        }
    }

    pub fn index(&self) -> Option<u32> {
        match self {
            BitDeclaration::Name(_) => None,
            BitDeclaration::Full { index, .. } => *index,
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            BitDeclaration::Name(_) => None,
            BitDeclaration::Full { doc, .. } => doc.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDeclaration {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleDeclaration {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub rule: Rule,
}

impl ModelDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Adds a flag at an explicit index.
    pub fn with_bit(mut self, name: impl Into<String>, index: u32) -> Self {
        self.bits.push(BitDeclaration::Full {
            name: name.into(),
            index: Some(index),
            doc: None,
        });
        self
    }

    /// Adds flags by name; each takes its list position as index.
    pub fn with_flags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bits
            .extend(names.into_iter().map(|n| BitDeclaration::Name(n.into())));
        self
    }

    pub fn with_category<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.push(CategoryDeclaration {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(RuleDeclaration { id: None, rule });
        self
    }

    pub fn with_rule_id(mut self, id: impl Into<String>, rule: Rule) -> Self {
        self.rules.push(RuleDeclaration {
            id: Some(id.into()),
            rule,
        });
        self
    }
}

fn ordered_categories<'de, D>(deserializer: D) -> Result<Vec<CategoryDeclaration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<CategoryDeclaration>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of categories or a map of category name to values")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(cat) = seq.next_element::<CategoryDeclaration>()? {
                out.push(cat);
            }
            Ok(out)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((name, values)) = map.next_entry::<String, Vec<String>>()? {
                out.push(CategoryDeclaration { name, values });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(CategoriesVisitor)
}
