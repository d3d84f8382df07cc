//! An in-memory `Store`.
//!
//! Note: this is compiled into the binary as well so that sessions can be driven end to end without
//! a database.

use crate::error::Res;
use crate::sync::{Collection, Document, Store};
use anyhow::bail;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

type Key = (String, Collection, String);

/// Holds documents in a map. Writes can be made to fail so that callers can check how they behave
/// when the remote side is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<Key, Document>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `fail` is true, every subsequent `put` and `delete` returns an error without changing
    /// anything.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The number of `put` and `delete` calls received, including failed ones.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The number of documents the user has in `collection`.
    pub async fn len(&self, user_id: &str, collection: Collection) -> usize {
        self.docs
            .lock()
            .await
            .keys()
            .filter(|(u, c, _)| u == user_id && *c == collection)
            .count()
    }

    fn begin_write(&self, action: &str, collection: Collection, id: &str) -> Res<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Unable to {action} {collection}/{id}: the store is refusing writes");
        }
        Ok(())
    }
}

fn key(user_id: &str, collection: Collection, id: &str) -> Key {
    (user_id.to_string(), collection, id.to_string())
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn put(
        &self,
        user_id: &str,
        collection: Collection,
        id: &str,
        doc: Document,
    ) -> Res<()> {
        self.begin_write("put", collection, id)?;
        self.docs.lock().await.insert(key(user_id, collection, id), doc);
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        collection: Collection,
        id: &str,
    ) -> Res<Option<Document>> {
        Ok(self
            .docs
            .lock()
            .await
            .get(&key(user_id, collection, id))
            .cloned())
    }

    async fn get_all(&self, user_id: &str, collection: Collection) -> Res<Vec<Document>> {
        Ok(self
            .docs
            .lock()
            .await
            .iter()
            .filter(|((u, c, _), _)| u == user_id && *c == collection)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn delete(&self, user_id: &str, collection: Collection, id: &str) -> Res<()> {
        self.begin_write("delete", collection, id)?;
        self.docs.lock().await.remove(&key(user_id, collection, id));
        Ok(())
    }
}
