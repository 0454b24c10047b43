//! # Database: relation registry, transaction lifecycle, transaction dispatch
//!
//! A [`Database`] owns one OKVS [`Driver`] plus the [`Store`] for every
//! relation registered against it. It is the only entry point that opens
//! transactions; every `add`/`remove`/`ask`/pattern-scan call elsewhere in
//! the crate receives a transaction handle rather than the database
//! itself, so a single pipeline can interleave operations on several
//! relations inside one atomic unit of work.
//!
//! ## Transaction dispatch (§4.5, §9)
//!
//! The spec's `@transactional` decorator detects, via call-context
//! introspection, whether its wrapped function was handed a live
//! transaction (reuse it) or only a database (open one, commit on success,
//! roll back on failure). Rust has no argument-position reflection, so
//! this crate follows the spec's own design-notes alternative: an
//! `IntoTxn` trait implemented by both `&Database` and `&mut dyn
//! Transaction`, dispatched by ordinary method resolution rather than
//! runtime inspection. A function that needs a transaction takes `impl
//! IntoTxn` and calls `.with_txn(|tr| ...)`; a nested call handed an
//! already-open transaction gets the "reuse" behaviour for free, with no
//! special-casing at the call site.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::binding::Binding;
use crate::config::Config;
use crate::error::{Result, UsageError};
use crate::okvs::{self, Driver, Transaction};
use crate::query;
use crate::relation::Relation;
use crate::store::{Pattern, Store};
use crate::value::Tuple;

/// Dispatches a named computation onto either a fresh transaction (opened
/// and closed around the call) or an existing one (reused as-is). See the
/// module docs for why this replaces the spec's reflection-based
/// `@transactional` decorator.
pub trait IntoTxn {
    fn with_txn<T>(self, f: impl FnOnce(&mut dyn Transaction) -> Result<T>) -> Result<T>;
}

impl IntoTxn for &Database {
    /// Opens a new transaction, commits it if `f` succeeds, rolls it back
    /// otherwise. This is the "only a database was supplied" branch of the
    /// spec's decorator.
    fn with_txn<T>(self, f: impl FnOnce(&mut dyn Transaction) -> Result<T>) -> Result<T> {
        debug!(target: "hoply::txn", "begin");
        let mut tr = self.driver.begin()?;
        match f(&mut *tr) {
            Ok(value) => {
                tr.commit()?;
                debug!(target: "hoply::txn", "commit");
                Ok(value)
            }
            Err(err) => {
                let _ = tr.rollback();
                debug!(target: "hoply::txn", error = %err, "rollback");
                Err(err)
            }
        }
    }
}

impl IntoTxn for &mut dyn Transaction {
    /// Reuses the caller's already-open transaction: no begin, no commit,
    /// no rollback. This is the "a live handle was already supplied"
    /// branch — the nesting behaviour §4.5 requires.
    fn with_txn<T>(self, f: impl FnOnce(&mut dyn Transaction) -> Result<T>) -> Result<T> {
        f(self)
    }
}

/// Owns the OKVS driver and every relation registered against it. A
/// database instance is a plain value — there is no global mutable state
/// anywhere in the crate (§9).
pub struct Database {
    driver: Box<dyn Driver>,
    relations: RwLock<HashMap<String, Store>>,
}

impl Database {
    /// Open a database using the backend named by `config`.
    #[instrument(target = "hoply::okvs", skip(config))]
    pub fn open(config: &Config) -> Result<Self> {
        let driver = okvs::open(&config.okvs)?;
        tracing::info!(target: "hoply::okvs", backend = ?config.okvs.backend, "database opened");
        Ok(Database { driver, relations: RwLock::new(HashMap::new()) })
    }

    /// Open an in-memory database with default configuration. The common
    /// case for tests and for embedding in a larger process.
    #[must_use]
    pub fn in_memory() -> Self {
        Database { driver: Box::new(okvs::memory::MemoryDriver::new()), relations: RwLock::new(HashMap::new()) }
    }

    /// Flush and close the underlying backend.
    pub fn close(&self) -> Result<()> {
        self.driver.close()?;
        tracing::info!(target: "hoply::okvs", "database closed");
        Ok(())
    }

    /// Register a relation. Re-registering the same name with a different
    /// arity is a [`UsageError::RelationRedeclared`]; re-registering with
    /// the same arity is accepted (idempotent, matching the store's own
    /// idempotent `add`).
    pub fn register(&self, relation: Relation) -> Result<()> {
        let mut relations = self.relations.write();
        if let Some(existing) = relations.get(relation.name()) {
            if existing.relation().arity() != relation.arity() {
                return Err(UsageError::RelationRedeclared(relation.name().to_string()).into());
            }
            return Ok(());
        }
        relations.insert(relation.name().to_string(), Store::new(relation));
        Ok(())
    }

    /// Look up the store for a registered relation.
    pub fn store(&self, name: &str) -> Result<Store> {
        self.relations.read().get(name).cloned().ok_or_else(|| UsageError::UnknownRelation(name.to_string()).into())
    }

    /// Open a new transaction directly, bypassing `IntoTxn` dispatch. The
    /// returned handle must be consumed by exactly one of
    /// `commit`/`rollback`.
    pub fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        self.driver.begin()
    }

    /// Insert a tuple into `relation`, writing every planned permutation.
    pub fn add(&self, ctx: impl IntoTxn, relation: &str, tuple: &Tuple) -> Result<()> {
        let store = self.store(relation)?;
        ctx.with_txn(|tr| store.add(tr, tuple))
    }

    /// Remove a tuple from `relation` across every planned permutation.
    pub fn remove(&self, ctx: impl IntoTxn, relation: &str, tuple: &Tuple) -> Result<()> {
        let store = self.store(relation)?;
        ctx.with_txn(|tr| store.remove(tr, tuple))
    }

    /// Presence test for a fully-formed tuple.
    pub fn ask(&self, ctx: impl IntoTxn, relation: &str, tuple: &Tuple) -> Result<bool> {
        let store = self.store(relation)?;
        ctx.with_txn(|tr| store.ask(tr, tuple))
    }

    /// Seed a query pipeline from a single pattern against `relation`:
    /// the `FROM` operation of §8's end-to-end scenarios. Further
    /// where-steps chain from the returned bindings via
    /// [`crate::query::where_step`] against the same transaction.
    pub fn from(&self, ctx: impl IntoTxn, relation: &str, pattern: Pattern) -> Result<Vec<Binding>> {
        let store = self.store(relation)?;
        ctx.with_txn(|tr| store.from(tr, &pattern, &Binding::new()))
    }
}

/// Run a multi-step conjunctive query pipeline over several relations
/// inside one transaction, as built from [`query::where_step`] /
/// [`query::compose`]. `steps` is applied left-to-right starting from the
/// empty seed binding; see [`query::seed`] and [`query::compose`].
pub fn run_pipeline<'a>(tr: &'a dyn Transaction, steps: Vec<query::Step<'a>>) -> Result<Vec<Binding>> {
    let mut stream = query::seed();
    for step in steps {
        stream = step(stream);
    }
    stream.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn edge_db() -> Database {
        let db = Database::in_memory();
        db.register(Relation::new("edge", vec!["src".into(), "dst".into()])).unwrap();
        db
    }

    #[test]
    fn with_txn_on_database_commits_on_success() {
        let db = edge_db();
        let tuple = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        db.add(&db, "edge", &tuple).unwrap();
        assert!(db.ask(&db, "edge", &tuple).unwrap());
    }

    #[test]
    fn with_txn_on_database_rolls_back_on_error() {
        let db = edge_db();
        let tuple = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        let result: Result<()> = (&db).with_txn(|tr| {
            let store = db.store("edge").unwrap();
            store.add(tr, &tuple)?;
            Err(UsageError::UnknownRelation("boom".to_string()).into())
        });
        assert!(result.is_err());
        assert!(!db.ask(&db, "edge", &tuple).unwrap());
    }

    #[test]
    fn nested_call_reuses_an_open_transaction() {
        let db = edge_db();
        let a = Tuple::new(vec![Value::from("a"), Value::from("b")]);
        let b = Tuple::new(vec![Value::from("c"), Value::from("d")]);

        let mut tr = db.begin().unwrap();
        db.add(&mut *tr, "edge", &a).unwrap();
        db.add(&mut *tr, "edge", &b).unwrap();
        // Neither `add` committed on its own: both writes are visible only
        // once this outer transaction commits.
        tr.commit().unwrap();

        assert!(db.ask(&db, "edge", &a).unwrap());
        assert!(db.ask(&db, "edge", &b).unwrap());
    }

    #[test]
    fn registering_same_relation_twice_with_same_arity_is_idempotent() {
        let db = edge_db();
        db.register(Relation::new("edge", vec!["src".into(), "dst".into()])).unwrap();
    }

    #[test]
    fn registering_same_name_with_different_arity_is_a_usage_error() {
        let db = edge_db();
        let result = db.register(Relation::new("edge", vec!["a".into(), "b".into(), "c".into()]));
        assert!(result.is_err());
    }

    #[test]
    fn unregistered_relation_is_a_usage_error() {
        let db = Database::in_memory();
        let tuple = Tuple::new(vec![Value::from("a")]);
        assert!(db.ask(&db, "missing", &tuple).is_err());
    }
}
