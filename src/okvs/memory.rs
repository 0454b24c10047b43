//! # In-memory OKVS backend
//!
//! Keys and values live in a shared [`im::OrdMap`], an ordered map with
//! structural sharing. A transaction clones the map at `begin` time —
//! `O(1)` thanks to structural sharing — and reads against that frozen
//! snapshot for its whole lifetime: writes from transactions that commit
//! afterwards never become visible to it. This is what gives the memory
//! backend snapshot isolation without any separate MVCC bookkeeping.
//!
//! Writes are buffered in a private overlay and only applied to the
//! shared map on `commit`. There is no conflict detection: two
//! concurrent writers to the same key both succeed, last commit wins.
//! That is weaker than serializability, but it is what the spec's
//! transaction contract requires (isolated reads, atomic commit) and no
//! more.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::okvs::{Driver, RangeOptions, Row, Transaction};

type Map = im::OrdMap<Vec<u8>, Vec<u8>>;

pub struct MemoryDriver {
    inner: Arc<RwLock<Map>>,
}

impl MemoryDriver {
    #[must_use]
    pub fn new() -> Self {
        MemoryDriver { inner: Arc::new(RwLock::new(Map::new())) }
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        MemoryDriver::new()
    }
}

impl Driver for MemoryDriver {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        let snapshot = self.inner.read().clone();
        Ok(Box::new(MemoryTransaction { driver: Arc::clone(&self.inner), snapshot, writes: im::OrdMap::new() }))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryTransaction {
    driver: Arc<RwLock<Map>>,
    snapshot: Map,
    writes: im::OrdMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    fn effective_view(&self) -> Map {
        let mut view = self.snapshot.clone();
        for (key, maybe_value) in &self.writes {
            match maybe_value {
                Some(value) => {
                    view.insert(key.clone(), value.clone());
                }
                None => {
                    view.remove(key);
                }
            }
        }
        view
    }
}

impl Transaction for MemoryTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(overlay) = self.writes.get(key) {
            return Ok(overlay.clone());
        }
        Ok(self.snapshot.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_range(&self, opts: &RangeOptions) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        use std::ops::Bound;

        let view = self.effective_view();
        let start = if opts.start_inclusive { Bound::Included(opts.start.clone()) } else { Bound::Excluded(opts.start.clone()) };
        let end = if opts.end_inclusive { Bound::Included(opts.end.clone()) } else { Bound::Excluded(opts.end.clone()) };

        let mut rows: Vec<Row> = view.range((start, end)).map(|(k, v)| (k.clone(), v.clone())).collect();
        if opts.reverse {
            rows.reverse();
        }
        let rows: Vec<Row> = match opts.limit {
            Some(limit) => rows.into_iter().skip(opts.offset).take(limit).collect(),
            None => rows.into_iter().skip(opts.offset).collect(),
        };
        Ok(Box::new(rows.into_iter()))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let mut guard = self.driver.write();
        for (key, maybe_value) in &self.writes {
            match maybe_value {
                Some(value) => {
                    guard.insert(key.clone(), value.clone());
                }
                None => {
                    guard.remove(key);
                }
            }
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_within_same_transaction() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        tr.put(b"a", b"1").unwrap();
        assert_eq!(tr.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn writes_invisible_until_commit() {
        let driver = MemoryDriver::new();
        let mut writer = driver.begin().unwrap();
        writer.put(b"a", b"1").unwrap();

        let reader = driver.begin().unwrap();
        assert_eq!(reader.get(b"a").unwrap(), None);

        writer.commit().unwrap();
        let reader2 = driver.begin().unwrap();
        assert_eq!(reader2.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn reader_snapshot_unaffected_by_later_commit() {
        let driver = MemoryDriver::new();
        let mut seed = driver.begin().unwrap();
        seed.put(b"a", b"1").unwrap();
        seed.commit().unwrap();

        let reader = driver.begin().unwrap();
        let mut writer = driver.begin().unwrap();
        writer.put(b"a", b"2").unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn rollback_discards_writes() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        tr.put(b"a", b"1").unwrap();
        tr.rollback().unwrap();

        let reader = driver.begin().unwrap();
        assert_eq!(reader.get(b"a").unwrap(), None);
    }

    #[test]
    fn prefix_scan_is_ordered_and_excludes_other_prefixes() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        tr.put(&[0x01, 0x02], b"a").unwrap();
        tr.put(&[0x01, 0x01], b"b").unwrap();
        tr.put(&[0x02, 0x00], b"c").unwrap();
        tr.commit().unwrap();

        let reader = driver.begin().unwrap();
        let rows: Vec<Row> = reader.scan_prefix(&[0x01]).unwrap().collect();
        assert_eq!(rows, vec![(vec![0x01, 0x01], b"b".to_vec()), (vec![0x01, 0x02], b"a".to_vec())]);
    }

    #[test]
    fn delete_removes_committed_key() {
        let driver = MemoryDriver::new();
        let mut tr = driver.begin().unwrap();
        tr.put(b"a", b"1").unwrap();
        tr.commit().unwrap();

        let mut tr2 = driver.begin().unwrap();
        tr2.delete(b"a").unwrap();
        tr2.commit().unwrap();

        let reader = driver.begin().unwrap();
        assert_eq!(reader.get(b"a").unwrap(), None);
    }
}
