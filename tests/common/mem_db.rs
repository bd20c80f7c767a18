//! A volatile, in-memory implementation of [`KVStore`] that backs the round store in tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use aedpos_rs::round_store::pluggables::{KVGet, KVStore, WriteBatch};

/// Round store contents shared between every clone of a [`MemDB`].
type Table = HashMap<Vec<u8>, Vec<u8>>;

/// An in-memory implementation of [`KVStore`]. Clones share the same table.
#[derive(Clone)]
pub(crate) struct MemDB(Arc<Mutex<Table>>);

impl MemDB {
    pub(crate) fn new() -> MemDB {
        MemDB(Arc::new(Mutex::new(Table::new())))
    }

    /// Get a copy of every key-value pair currently stored. Used to check that rejected transitions leave
    /// the store untouched.
    pub(crate) fn dump(&self) -> Table {
        self.0.lock().unwrap().clone()
    }
}

impl KVStore for MemDB {
    type WriteBatch = MemWriteBatch;
    type Snapshot<'a> = MemDBSnapshot<'a>;

    fn write(&mut self, wb: Self::WriteBatch) {
        self.0.lock().unwrap().extend(wb.0);
    }

    fn snapshot<'b>(&'b self) -> MemDBSnapshot<'b> {
        MemDBSnapshot(self.0.lock().unwrap())
    }
}

impl KVGet for MemDB {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(key).cloned()
    }
}

/// Pending writes, applied all at once by [`MemDB::write`]. A later `set` of the same key wins.
pub(crate) struct MemWriteBatch(Table);

impl WriteBatch for MemWriteBatch {
    fn new() -> Self {
        MemWriteBatch(Table::new())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.0.insert(key.to_vec(), value.to_vec());
    }
}

/// A consistent view of a [`MemDB`], holding its lock for as long as it lives.
pub(crate) struct MemDBSnapshot<'a>(MutexGuard<'a, Table>);

impl KVGet for MemDBSnapshot<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key).cloned()
    }
}
