//! The contract between a session and wherever its records are kept.
//!
//! Records are stored as schema-versioned JSON documents, grouped into a `Collection` and keyed by
//! the owning user's ID plus a document ID. The `Store` trait is implemented by the SQLite database
//! in `crate::db` and by `MemoryStore`, which the tests use.

mod memory;

pub use memory::MemoryStore;

use crate::error::Res;
use anyhow::{ensure, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The named groups of documents kept for every user.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Transactions,
    Budgets,
    Categories,
    Stats,
    Profile,
}

serde_plain::derive_display_from_serialize!(Collection);
serde_plain::derive_fromstr_from_deserialize!(Collection);

/// The stored form of a record: its JSON body tagged with the schema version that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub schema_version: u32,
    pub body: serde_json::Value,
}

/// A type that is persisted as a `Document` in a `Collection`.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Bump this when the serialized shape changes in a way older readers cannot handle.
    const SCHEMA_VERSION: u32;
}

pub fn encode<R: Record>(record: &R) -> Res<Document> {
    let body = serde_json::to_value(record)
        .with_context(|| format!("Unable to encode a {} document", R::COLLECTION))?;
    Ok(Document {
        schema_version: R::SCHEMA_VERSION,
        body,
    })
}

/// Decodes `doc`, refusing documents written by a newer schema than this build understands.
pub fn decode<R: Record>(doc: &Document) -> Res<R> {
    ensure!(
        doc.schema_version <= R::SCHEMA_VERSION,
        "A {} document has schema version {} but the highest supported is {}",
        R::COLLECTION,
        doc.schema_version,
        R::SCHEMA_VERSION
    );
    serde_json::from_value(doc.body.clone())
        .with_context(|| format!("Unable to decode a {} document", R::COLLECTION))
}

/// Decodes every document in `docs`.
pub fn decode_all<R: Record>(docs: &[Document]) -> Res<Vec<R>> {
    docs.iter().map(decode).collect()
}

/// A document store keyed by user ID, collection and document ID.
///
/// All methods take `&self` so that a store can be shared behind an `Arc` with the background
/// tasks that perform fire-and-forget writes.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Inserts or replaces a document.
    async fn put(&self, user_id: &str, collection: Collection, id: &str, doc: Document)
        -> Res<()>;

    async fn get(&self, user_id: &str, collection: Collection, id: &str)
        -> Res<Option<Document>>;

    /// Every document the user has in `collection`, in no particular order.
    async fn get_all(&self, user_id: &str, collection: Collection) -> Res<Vec<Document>>;

    /// Deletes a document. Deleting a document that does not exist succeeds.
    async fn delete(&self, user_id: &str, collection: Collection, id: &str) -> Res<()>;
}
