//! # Backend service traits
//!
//! The client never owns durable state. Everything goes through three
//! services provided by the backend platform:
//!
//! | Trait | Service |
//! |-------|---------|
//! | [`IdentityService`] | Credential sign-in / sign-up / sign-out and a stream of identity transitions. |
//! | [`DocumentStore`] | Collections of JSON [`Document`]s: point reads, full overwrites, inserts with store-assigned ids, deletes, equality [`Query`]s and live snapshot listeners. |
//! | [`BlobStore`] | Uploads returning a durable download URL. |
//!
//! [`Backend`] bundles the three and is implemented for every type (and
//! every `Arc`) providing them. [`crate::MemoryBackend`] is the in-process
//! implementation used by tests and local runs.
//!
//! Documents carry untyped `serde_json::Value` bodies; [`FromDocument`] and
//! [`encode`] convert them to and from the models in [`crate::models`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::BackendError;
use crate::models::Identity;

/// A document read from a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        Ok(T::deserialize(&self.data)?)
    }

    /// Whether the body has `field` equal to `value`.
    pub fn field_eq(&self, field: &str, value: &Value) -> bool {
        self.data.get(field) == Some(value)
    }
}

/// Types built from a whole document, id included.
pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> Result<Self, BackendError>;
}

/// Encode a model as a document body.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, BackendError> {
    Ok(serde_json::to_value(value)?)
}

/// A conjunction of field equality filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method adding `field == value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    /// Whether `doc` satisfies every filter. An empty query matches everything.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| doc.field_eq(field, value))
    }
}

/// Live view of a collection: the current contents first, then one
/// snapshot per change.
pub type SnapshotStream = BoxStream<'static, Result<Vec<Document>, BackendError>>;

/// Identity transitions, starting with the current identity.
pub type IdentityStream = BoxStream<'static, Option<Identity>>;

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    /// Create an account. The new account is signed in on success.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    fn current_identity(&self) -> Option<Identity>;

    fn identity_changes(&self) -> IdentityStream;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Create or fully overwrite the document `id`.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), BackendError>;

    /// Insert a new document and return its store-assigned id.
    async fn add(&self, collection: &str, data: Value) -> Result<String, BackendError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError>;

    fn listen(&self, collection: &str) -> SnapshotStream;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path` and return its download URL.
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, BackendError>;
}

/// Everything the synchronizer needs from the backend platform.
pub trait Backend: IdentityService + DocumentStore + BlobStore + 'static {}

impl<T> Backend for T where T: IdentityService + DocumentStore + BlobStore + 'static {}

#[async_trait]
impl<T: IdentityService + ?Sized> IdentityService for Arc<T> {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        (**self).sign_up(email, password).await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        (**self).sign_out().await
    }

    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }

    fn identity_changes(&self) -> IdentityStream {
        (**self).identity_changes()
    }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        (**self).get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), BackendError> {
        (**self).set(collection, id, data).await
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, BackendError> {
        (**self).add(collection, data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        (**self).delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError> {
        (**self).query(collection, query).await
    }

    fn listen(&self, collection: &str) -> SnapshotStream {
        (**self).listen(collection)
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, BackendError> {
        (**self).upload(path, data).await
    }
}
