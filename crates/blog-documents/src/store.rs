//! Document store contract.

use crate::{DocumentError, DocumentResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A document's fields.
pub type Document = serde_json::Map<String, Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Document,
}

/// Hosted document database, reduced to what the blog needs.
///
/// Every call may suspend; failures surface as [`DocumentError`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document. `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> DocumentResult<Option<Document>>;

    /// Create or overwrite a document.
    async fn set_document(&self, collection: &str, id: &str, fields: Document) -> DocumentResult<()>;

    /// Merge fields into an existing document. Fails with `NotFound` if absent.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> DocumentResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentResult<()>;

    /// Create a document under a generated id and return that id.
    async fn add_document(&self, collection: &str, fields: Document) -> DocumentResult<String>;

    /// Every document in a collection, in no particular order.
    async fn list_documents(&self, collection: &str) -> DocumentResult<Vec<DocumentSnapshot>>;

    /// Documents whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> DocumentResult<Vec<DocumentSnapshot>> {
        let docs = self.list_documents(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }
}

/// Serialize a record into document fields.
pub fn to_document<T: Serialize>(value: &T) -> DocumentResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::InvalidData(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize document fields into a record.
pub fn from_document<T: DeserializeOwned>(fields: Document) -> DocumentResult<T> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}
