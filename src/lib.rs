//! # hoply
//!
//! An ordered n-tuple store with a pattern-matching query engine, layered
//! over a pluggable ordered key-value store (OKVS).
//!
//! Tuples of arbitrary arity and heterogeneous, typed columns are stored
//! as a named [`Relation`]. Every tuple is written once per permutation in
//! the relation's [`planner`]-computed covering set, so any pattern whose
//! bound columns form a contiguous prefix under some rotation is answered
//! by a single prefix scan rather than a full relation scan.
//!
//! Queries are built from [`query::where_step`]: given a pattern of
//! concrete values and named variables, and a stream of upstream
//! bindings, it produces a stream of extended bindings by joining against
//! the store. Chaining where-steps via [`query::compose`] realises a
//! conjunctive query; the standard stream combinators (`skip`, `limit`,
//! `paginate`, `count`, `map`, `filter`, `unique`, `mean`, `pick`) operate
//! on the resulting [`query::BindingStream`].
//!
//! ## Usage
//!
//! ```rust
//! use hoply::{Database, Relation};
//! use hoply::store::{var, Pattern, Slot};
//! use hoply::value::{Tuple, Value};
//!
//! let db = Database::in_memory();
//! db.register(Relation::new("site", vec!["url".into(), "title".into()])).unwrap();
//!
//! let tuple = Tuple::new(vec![Value::from("hyperdev.fr"), Value::from("HyperDev")]);
//! db.add(&db, "site", &tuple).unwrap();
//!
//! let pattern = Pattern::new(vec![var("url"), Slot::Bound(Value::from("HyperDev"))]);
//! let results = db.from(&db, "site", pattern).unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].get("url"), Some(&Value::from("hyperdev.fr")));
//! ```
//!
//! ## Module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`value`] | The [`Value`] tagged union and fixed-arity [`Tuple`] |
//! | [`codec`] | Order-preserving, self-delimiting tuple encoding |
//! | [`planner`] | Covering permutation sets for a relation's arity |
//! | [`relation`] | Relation schema: name, columns, prefix, plan |
//! | [`okvs`] | The driver/transaction trait surface and its backends |
//! | [`store`] | Per-relation physical storage: `add`/`remove`/`ask`/`from` |
//! | [`binding`] | Immutable, structurally-shared variable bindings |
//! | [`query`] | Where-steps, pipeline composition, stream combinators |
//! | [`database`] | Relation registry and transaction-handle dispatch |
//! | [`config`] | Backend selection and tuning, loaded via `figment` |
//! | [`error`] | The three-way error taxonomy (usage / codec / transaction) |
//!
//! Out of scope for this crate (see `DESIGN.md`): the OKVS backend's own
//! durability internals beyond the [`okvs::Driver`] surface, ingestion
//! scripts, a CLI, fuzzy-search indices, and a graph-shaped façade — the
//! n-tuple model already subsumes it.

pub mod binding;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod okvs;
pub mod planner;
pub mod query;
pub mod relation;
pub mod store;
pub mod value;

pub use binding::Binding;
pub use config::Config;
pub use database::{Database, IntoTxn};
pub use error::{CodecError, Error, Result, TxnError, UsageError};
pub use okvs::{strinc, Driver, RangeOptions, Row, Transaction};
pub use planner::{plan, IndexPlan};
pub use query::{compose, count, filter, limit, map, mean, paginate, pick, seed, skip, unique, where_step, BindingStream, Step};
pub use relation::Relation;
pub use store::{var, Pattern, Slot, Store};
pub use value::{Tuple, Value};
