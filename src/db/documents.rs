use crate::db::Db;
use crate::error::Res;
use crate::sync::{Collection, Document, Store};
use anyhow::Context;
use chrono::Utc;
use tracing::trace;

type DocumentRow = (i64, String);

fn to_document(collection: Collection, id: &str, row: DocumentRow) -> Res<Document> {
    let (schema_version, body) = row;
    let schema_version = u32::try_from(schema_version)
        .with_context(|| format!("Invalid schema version {schema_version} for {collection}/{id}"))?;
    let body = serde_json::from_str(&body)
        .with_context(|| format!("The stored body of {collection}/{id} is not valid JSON"))?;
    Ok(Document {
        schema_version,
        body,
    })
}

#[async_trait::async_trait]
impl Store for Db {
    async fn put(
        &self,
        user_id: &str,
        collection: Collection,
        id: &str,
        doc: Document,
    ) -> Res<()> {
        trace!("put {collection}/{id}");
        let body = serde_json::to_string(&doc.body)
            .with_context(|| format!("Unable to serialize {collection}/{id}"))?;
        sqlx::query(
            "INSERT INTO documents (user_id, collection, id, schema_version, body, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, collection, id) DO UPDATE SET
                schema_version = excluded.schema_version,
                body = excluded.body,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(collection.to_string())
        .bind(id)
        .bind(i64::from(doc.schema_version))
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to write {collection}/{id}"))?;
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        collection: Collection,
        id: &str,
    ) -> Res<Option<Document>> {
        trace!("get {collection}/{id}");
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT schema_version, body FROM documents
             WHERE user_id = ? AND collection = ? AND id = ?",
        )
        .bind(user_id)
        .bind(collection.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to read {collection}/{id}"))?;
        row.map(|row| to_document(collection, id, row)).transpose()
    }

    async fn get_all(&self, user_id: &str, collection: Collection) -> Res<Vec<Document>> {
        trace!("get_all {collection}");
        let rows: Vec<(String, i64, String)> = sqlx::query_as(
            "SELECT id, schema_version, body FROM documents
             WHERE user_id = ? AND collection = ?
             ORDER BY id",
        )
        .bind(user_id)
        .bind(collection.to_string())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to read the {collection} collection"))?;
        rows.into_iter()
            .map(|(id, version, body)| to_document(collection, &id, (version, body)))
            .collect()
    }

    async fn delete(&self, user_id: &str, collection: Collection, id: &str) -> Res<()> {
        trace!("delete {collection}/{id}");
        sqlx::query("DELETE FROM documents WHERE user_id = ? AND collection = ? AND id = ?")
            .bind(user_id)
            .bind(collection.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete {collection}/{id}"))?;
        Ok(())
    }
}
