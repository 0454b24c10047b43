//! # OKVS driver surface
//!
//! The store and query engine never touch a storage backend directly;
//! they only see the [`Driver`]/[`Transaction`] traits in this module.
//! Two backends implement them: [`memory`] (a `BTreeMap`-equivalent
//! in-memory ordered map) and [`fjall_backend`] (a persistent LSM-tree
//! engine). Both operate on flat `Vec<u8>` keys — the relation/codec
//! layers are responsible for producing keys whose byte order matches
//! tuple order; this module only promises to preserve that order.
//!
//! A [`Transaction`] is created by [`Driver::begin`] and consumed by
//! exactly one of `commit`/`rollback` — both take `self: Box<Self>` so
//! the type system rules out using a transaction after it closes.

pub mod fjall_backend;
pub mod memory;

use crate::config::{Backend, OkvsConfig};
use crate::error::Result;

/// A half-open or closed byte-string range scan, with pagination and
/// direction modifiers applied by the backend before any rows reach the
/// caller (so `limit` bounds the work done, not just the result size).
#[derive(Debug, Clone)]
pub struct RangeOptions {
    pub start: Vec<u8>,
    pub start_inclusive: bool,
    pub end: Vec<u8>,
    pub end_inclusive: bool,
    pub offset: usize,
    pub limit: Option<usize>,
    pub reverse: bool,
}

impl RangeOptions {
    /// A scan over every key with the given prefix, ascending, unpaginated.
    #[must_use]
    pub fn prefix(prefix: &[u8]) -> Self {
        RangeOptions {
            start: prefix.to_vec(),
            start_inclusive: true,
            end: strinc(prefix),
            end_inclusive: false,
            offset: 0,
            limit: None,
            reverse: false,
        }
    }
}

/// One row of a scan: the raw key (needed by the store to recover which
/// permutation id and relation prefix produced it) and the raw value.
pub type Row = (Vec<u8>, Vec<u8>);

/// A single unit of atomic work against a [`Driver`]. Reads observe a
/// consistent snapshot taken at `begin`; writes are invisible to every
/// other transaction until `commit` returns.
pub trait Transaction {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Ascending scan of every key with the given prefix.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        self.scan_range(&RangeOptions::prefix(prefix))
    }

    fn scan_range(&self, opts: &RangeOptions) -> Result<Box<dyn Iterator<Item = Row> + '_>>;

    /// Make every write issued so far visible to subsequently-started
    /// transactions. Consumes the transaction; it cannot be reused.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write issued so far. Consumes the transaction.
    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Owns the underlying storage and hands out [`Transaction`]s.
pub trait Driver: Send + Sync {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>>;

    /// Flush/close the backend. Called once, at database shutdown.
    fn close(&self) -> Result<()>;
}

/// Build the driver named by `config`.
pub fn open(config: &OkvsConfig) -> Result<Box<dyn Driver>> {
    match config.backend {
        Backend::Memory => Ok(Box::new(memory::MemoryDriver::new())),
        Backend::Fjall => Ok(Box::new(fjall_backend::FjallDriver::open(config)?)),
    }
}

/// The lexicographic successor of `bytes` within its own length class:
/// strip trailing `0xFF` bytes, then increment the last remaining byte.
/// Used to turn a prefix into the exclusive upper bound of a prefix scan.
///
/// Every prefix this crate constructs (relation names and permutation
/// ids, both tuple-codec encoded) starts with a non-`0xFF` type tag, so
/// the degenerate all-`0xFF` input never occurs in practice; it is a
/// logic error in a caller if it does.
#[must_use]
pub fn strinc(bytes: &[u8]) -> Vec<u8> {
    let mut v = bytes.to_vec();
    while v.last() == Some(&0xFF) {
        v.pop();
    }
    match v.last_mut() {
        Some(last) => {
            *last += 1;
            v
        }
        None => panic!("strinc: input has no byte below 0xFF to increment"),
    }
}
