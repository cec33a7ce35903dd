//! Type aliases for boxed closures produced by the compiler.

use acbp_core::{CategoryTuple, Mask};

/// Category test: evaluates a compiled predicate against one tuple.
pub type TupleTest = Box<dyn Fn(&CategoryTuple) -> bool + Send + Sync>;

/// Clause test: evaluates one compiled rule against a mask and a tuple.
pub type ClauseTest = Box<dyn Fn(Mask, &CategoryTuple) -> bool + Send + Sync>;
