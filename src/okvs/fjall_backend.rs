//! # fjall-backed persistent OKVS backend
//!
//! Keys and values are stored in a single fjall partition inside a
//! transactional keyspace rooted at [`OkvsConfig::data_dir`]. fjall's
//! own write transactions already give us exactly the isolation and
//! atomicity contract [`crate::okvs::Transaction`] promises, so this
//! module is mostly a thin adapter from our byte-oriented trait onto
//! fjall's partition-scoped transaction API.
//!
//! Every transaction here is a fjall write transaction, even for
//! read-only callers: fjall is single-writer, and opening a write
//! transaction per [`crate::okvs::Driver::begin`] call is how the rest
//! of the crate gets a consistent snapshot without a separate read-only
//! code path to keep in sync with the write one.

use std::ops::Bound;

use fjall::{Config as FjallConfig, PartitionCreateOptions, PersistMode, TransactionalKeyspace, TransactionalPartitionHandle, WriteTransaction};

use crate::config::OkvsConfig;
use crate::error::{Result, TxnError};
use crate::okvs::{Driver, RangeOptions, Row, Transaction};

const PARTITION_NAME: &str = "hoply";

pub struct FjallDriver {
    keyspace: TransactionalKeyspace,
    partition: TransactionalPartitionHandle,
}

impl FjallDriver {
    pub fn open(config: &OkvsConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(TxnError::Io)?;
        let keyspace = FjallConfig::new(&config.data_dir)
            .open_transactional()
            .map_err(|err| TxnError::Backend(err.to_string()))?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .map_err(|err| TxnError::Backend(err.to_string()))?;
        tracing::debug!(target: "hoply::okvs", data_dir = %config.data_dir.display(), "fjall keyspace opened");
        Ok(FjallDriver { keyspace, partition })
    }
}

impl Driver for FjallDriver {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        let tx = self.keyspace.write_tx();
        Ok(Box::new(FjallTransaction { tx: Some(tx), partition: &self.partition }))
    }

    fn close(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll).map_err(|err| TxnError::Backend(err.to_string()))?;
        Ok(())
    }
}

struct FjallTransaction<'a> {
    // `None` only after `commit`/`rollback` has consumed it. The trait's
    // `self: Box<Self>` consuming signatures make reuse unreachable from
    // safe calling code, but `active`/`active_mut` still return
    // `TxnError::AlreadyClosed` rather than assuming that.
    tx: Option<WriteTransaction<'a>>,
    partition: &'a TransactionalPartitionHandle,
}

impl<'a> FjallTransaction<'a> {
    fn active(&self) -> Result<&WriteTransaction<'a>> {
        self.tx.as_ref().ok_or_else(|| TxnError::AlreadyClosed.into())
    }

    fn active_mut(&mut self) -> Result<&mut WriteTransaction<'a>> {
        self.tx.as_mut().ok_or_else(|| TxnError::AlreadyClosed.into())
    }
}

fn bounds(opts: &RangeOptions) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let start = if opts.start_inclusive { Bound::Included(opts.start.clone()) } else { Bound::Excluded(opts.start.clone()) };
    let end = if opts.end_inclusive { Bound::Included(opts.end.clone()) } else { Bound::Excluded(opts.end.clone()) };
    (start, end)
}

impl Transaction for FjallTransaction<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self.active()?.get(self.partition, key).map_err(|err| TxnError::Backend(err.to_string()))?;
        Ok(value.map(|slice| slice.to_vec()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.active_mut()?.insert(self.partition, key, value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.active_mut()?.remove(self.partition, key);
        Ok(())
    }

    fn scan_range(&self, opts: &RangeOptions) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        let (start, end) = bounds(opts);
        let mut rows = Vec::new();
        for entry in self.active()?.range(self.partition, (start, end)) {
            let (key, value) = entry.map_err(|err| TxnError::Backend(err.to_string()))?;
            rows.push((key.to_vec(), value.to_vec()));
        }
        if opts.reverse {
            rows.reverse();
        }
        let rows: Vec<Row> = match opts.limit {
            Some(limit) => rows.into_iter().skip(opts.offset).take(limit).collect(),
            None => rows.into_iter().skip(opts.offset).collect(),
        };
        Ok(Box::new(rows.into_iter()))
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or(TxnError::AlreadyClosed)?;
        tx.commit().map_err(|err| TxnError::Backend(err.to_string()))?;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        // Dropping an uncommitted fjall write transaction rolls it back.
        self.tx.take();
        Ok(())
    }
}
