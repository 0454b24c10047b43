//! # Relation schema
//!
//! A [`Relation`] names a set of tuples of fixed arity, carries column
//! labels for documentation/debugging, and owns the prefix byte sequence
//! that namespaces its physical keys inside a shared OKVS keyspace.

use crate::codec;
use crate::planner::{self, IndexPlan};
use crate::value::Value;

/// A named, fixed-arity relation and its planned index permutations.
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    columns: Vec<String>,
    prefix: Vec<u8>,
    plan: IndexPlan,
}

impl Relation {
    /// Declare a relation with the given name and column labels. The
    /// relation's arity is `columns.len()`. The physical key prefix is
    /// derived from the name (length-prefixed, so distinct names never
    /// collide as prefixes of one another).
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        let name = name.into();
        let arity = columns.len();
        // Encode the name as a tuple-codec text value: the escaping and
        // terminator discipline it already guarantees is exactly what a
        // prefix needs to never nest inside another relation's prefix.
        let mut prefix = Vec::new();
        codec::encode_value(&Value::Text(name.clone()), &mut prefix);
        Relation { name, columns, prefix, plan: planner::plan(arity) }
    }

    /// Declare a relation with an explicit, caller-chosen permutation set
    /// (e.g. a narrower set than the full planner output, for a
    /// high-arity relation where the caller doesn't need every pattern
    /// shape to be a single prefix scan). The caller is responsible for
    /// the covering contract the planner would otherwise guarantee.
    pub fn with_permutations(name: impl Into<String>, columns: Vec<String>, permutations: Vec<Vec<usize>>) -> Self {
        let mut r = Relation::new(name, columns);
        r.plan = IndexPlan::from_permutations(r.plan.arity(), permutations);
        r
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn plan(&self) -> &IndexPlan {
        &self.plan
    }
}
