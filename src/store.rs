//! # Store
//!
//! A [`Store`] owns one [`Relation`]'s physical layout: it writes every
//! planned permutation of a tuple on `add`, removes all of them on
//! `remove`, answers membership with `ask`, and answers partially bound
//! patterns with `from`, which picks a covering permutation, issues one
//! prefix scan, and rebuilds bindings for any free columns.
//!
//! Physical keys are `relation.prefix() ++ encode(permutation id) ++
//! encode_tuple(tuple.permute(perm))`. The permutation id is itself
//! tuple-codec encoded so every permutation's key range sorts as its own
//! contiguous block, never interleaved with another permutation's rows.

use crate::codec;
use crate::error::{Result, UsageError};
use crate::okvs::Transaction;
use crate::relation::Relation;
use crate::value::{Tuple, Value};
use crate::Binding;

/// One column of a query pattern: either a concrete value the column
/// must equal, or a named variable to bind (or check, if the same name
/// already occurs earlier in the pattern or in the upstream binding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Bound(Value),
    Var(String),
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Bound(value)
    }
}

/// Build a free-variable slot.
pub fn var(name: impl Into<String>) -> Slot {
    Slot::Var(name.into())
}

/// A fixed-arity pattern: one [`Slot`] per relation column, in column order.
#[derive(Debug, Clone)]
pub struct Pattern(Vec<Slot>);

impl Pattern {
    #[must_use]
    pub fn new(slots: Vec<Slot>) -> Self {
        Pattern(slots)
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.0
    }
}

/// Physical storage for one relation over a shared OKVS transaction.
#[derive(Debug, Clone)]
pub struct Store {
    relation: Relation,
}

impl Store {
    #[must_use]
    pub fn new(relation: Relation) -> Self {
        Store { relation }
    }

    #[must_use]
    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    fn check_arity(&self, arity: usize) -> Result<()> {
        if arity != self.relation.arity() {
            return Err(UsageError::ArityMismatch {
                relation: self.relation.name().to_string(),
                pattern_arity: arity,
                relation_arity: self.relation.arity(),
            }
            .into());
        }
        Ok(())
    }

    fn physical_key(&self, permutation_id: usize, permuted: &Tuple) -> Vec<u8> {
        let mut key = self.relation.prefix().to_vec();
        codec::encode_value(&Value::Int(permutation_id as i128), &mut key);
        key.extend(codec::encode_tuple(permuted));
        key
    }

    /// Write all planned permutations of `tuple`. Idempotent: adding the
    /// same tuple twice leaves the store in the same state as adding it once.
    pub fn add(&self, tr: &mut dyn Transaction, tuple: &Tuple) -> Result<()> {
        self.check_arity(tuple.arity())?;
        for (id, perm) in self.relation.plan().permutations().iter().enumerate() {
            let key = self.physical_key(id, &tuple.permute(perm));
            tracing::trace!(target: "hoply::store", relation = self.relation.name(), permutation = id, "put");
            tr.put(&key, &[])?;
        }
        Ok(())
    }

    /// Remove all planned permutations of `tuple`. Removing an absent
    /// tuple is a no-op, not an error.
    pub fn remove(&self, tr: &mut dyn Transaction, tuple: &Tuple) -> Result<()> {
        self.check_arity(tuple.arity())?;
        for (id, perm) in self.relation.plan().permutations().iter().enumerate() {
            let key = self.physical_key(id, &tuple.permute(perm));
            tracing::trace!(target: "hoply::store", relation = self.relation.name(), permutation = id, "delete");
            tr.delete(&key)?;
        }
        Ok(())
    }

    /// Does `tuple` exist in the store? A single point lookup against
    /// whichever planned permutation `covering` selects for "all columns
    /// bound" (any of them will do, since every permutation holds every
    /// tuple).
    pub fn ask(&self, tr: &dyn Transaction, tuple: &Tuple) -> Result<bool> {
        self.check_arity(tuple.arity())?;
        let all_columns: Vec<usize> = (0..tuple.arity()).collect();
        let (id, perm) = self.relation.plan().covering(&all_columns).ok_or_else(|| UsageError::NoCoveringPermutation {
            relation: self.relation.name().to_string(),
            arity: tuple.arity(),
            bound: all_columns.clone(),
        })?;
        let key = self.physical_key(id, &tuple.permute(perm));
        Ok(tr.get(&key)?.is_some())
    }

    /// The seed (upstream-less) where-step: scan for every tuple matching
    /// `pattern`'s bound columns, yielding one binding per match with
    /// `seed` extended by the pattern's free variables. A variable that
    /// repeats within `pattern`, or that `seed` already binds, must agree
    /// across every occurrence or the row is dropped.
    pub fn from(&self, tr: &dyn Transaction, pattern: &Pattern, seed: &Binding) -> Result<Vec<Binding>> {
        self.check_arity(pattern.arity())?;

        let bound_columns: Vec<usize> =
            pattern.slots().iter().enumerate().filter_map(|(i, slot)| matches!(slot, Slot::Bound(_)).then_some(i)).collect();

        let (permutation_id, perm) = self.relation.plan().covering(&bound_columns).ok_or_else(|| UsageError::NoCoveringPermutation {
            relation: self.relation.name().to_string(),
            arity: pattern.arity(),
            bound: bound_columns.clone(),
        })?;
        tracing::debug!(
            target: "hoply::store",
            relation = self.relation.name(),
            bound = ?bound_columns,
            permutation = permutation_id,
            "pattern scan"
        );

        // The scan prefix is the relation prefix, the permutation id, and
        // the bound values in this permutation's column order — they
        // occupy exactly its first `bound_columns.len()` positions, by
        // construction of `covering`.
        let mut prefix = self.relation.prefix().to_vec();
        codec::encode_value(&Value::Int(permutation_id as i128), &mut prefix);
        for &col in &perm[..bound_columns.len()] {
            if let Slot::Bound(value) = &pattern.slots()[col] {
                codec::encode_value(value, &mut prefix);
            }
        }

        let mut out = Vec::new();
        for (key, _value) in tr.scan_prefix(&prefix)? {
            let (_permutation_id_value, tuple_start) = codec::decode_value(&key, self.relation.prefix().len())?;
            let permuted = codec::decode_tuple(&key[tuple_start..], pattern.arity())?;
            let full = permuted.unpermute(perm);

            let mut binding = seed.clone();
            let mut matched = true;
            for (col, slot) in pattern.slots().iter().enumerate() {
                if let Slot::Var(name) = slot {
                    let value = full.get(col).expect("decoded tuple has pattern's arity").clone();
                    if let Some(existing) = binding.get(name) {
                        if *existing != value {
                            matched = false;
                            break;
                        }
                    } else {
                        binding = binding.set(name.clone(), value);
                    }
                }
            }
            if matched {
                out.push(binding);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okvs::memory::MemoryDriver;
    use crate::okvs::Driver;

    fn edge_store() -> Store {
        Store::new(Relation::new("edge", vec!["src".into(), "dst".into()]))
    }

    #[test]
    fn add_then_ask_is_true() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        let store = edge_store();
        let tuple = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        store.add(&mut *tr, &tuple).unwrap();
        assert!(store.ask(&*tr, &tuple).unwrap());
    }

    #[test]
    fn ask_false_before_add() {
        let driver = MemoryDriver::new();
        let tr = driver.begin().unwrap();
        let store = edge_store();
        let tuple = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        assert!(!store.ask(&*tr, &tuple).unwrap());
    }

    #[test]
    fn remove_is_idempotent_and_undoes_add() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        let store = edge_store();
        let tuple = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        store.add(&mut *tr, &tuple).unwrap();
        store.remove(&mut *tr, &tuple).unwrap();
        store.remove(&mut *tr, &tuple).unwrap();
        assert!(!store.ask(&*tr, &tuple).unwrap());
    }

    #[test]
    fn from_with_one_bound_column_finds_matching_rows() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        let store = edge_store();
        store.add(&mut *tr, &Tuple::new(vec![Value::from("a"), Value::from("b")])).unwrap();
        store.add(&mut *tr, &Tuple::new(vec![Value::from("a"), Value::from("c")])).unwrap();
        store.add(&mut *tr, &Tuple::new(vec![Value::from("z"), Value::from("q")])).unwrap();

        let pattern = Pattern::new(vec![Slot::Bound(Value::from("a")), var("dst")]);
        let results = store.from(&*tr, &pattern, &Binding::new()).unwrap();
        let mut dsts: Vec<String> = results.iter().map(|b| b.get("dst").unwrap().to_string()).collect();
        dsts.sort();
        assert_eq!(dsts, vec!["\"b\"", "\"c\""]);
    }

    #[test]
    fn from_with_repeated_variable_enforces_self_equality() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        let store = edge_store();
        store.add(&mut *tr, &Tuple::new(vec![Value::from("a"), Value::from("a")])).unwrap();
        store.add(&mut *tr, &Tuple::new(vec![Value::from("a"), Value::from("b")])).unwrap();

        let pattern = Pattern::new(vec![var("x"), var("x")]);
        let results = store.from(&*tr, &pattern, &Binding::new()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("x").unwrap(), &Value::from("a"));
    }

    #[test]
    fn arity_mismatch_is_a_usage_error() {
        let driver = MemoryDriver::new();
        let tr = driver.begin().unwrap();
        let store = edge_store();
        let pattern = Pattern::new(vec![var("x")]);
        assert!(store.from(&*tr, &pattern, &Binding::new()).is_err());
    }
}
