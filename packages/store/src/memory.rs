use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::watch;

use crate::backend::{
    BlobStore, Document, DocumentStore, IdentityService, IdentityStream, Query, SnapshotStream,
};
use crate::error::BackendError;
use crate::models::Identity;

/// Shortest password [`MemoryBackend`] accepts on sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A backend call that can be made to fail with [`MemoryBackend::fail_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    SignOut,
    Get,
    Set,
    Add,
    Delete,
    Query,
    Listen,
    Upload,
}

/// In-memory backend for testing and desktop fallback.
///
/// Clones share the same accounts, collections and blobs. Collections keep
/// insertion order, which is the order of snapshots and query results.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    accounts: Mutex<HashMap<String, Account>>,
    identity: watch::Sender<Option<Identity>>,
    collections: Mutex<HashMap<String, Collection>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<Operation, String>>,
}

#[derive(Debug)]
struct Account {
    uid: String,
    password: String,
}

#[derive(Debug)]
struct Collection {
    documents: Vec<Document>,
    /// Bumped on every write so listeners re-read the collection.
    version: watch::Sender<u64>,
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            version: watch::Sender::new(0),
        }
    }
}

impl Collection {
    fn touch(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                accounts: Mutex::default(),
                identity: watch::Sender::new(None),
                collections: Mutex::default(),
                blobs: Mutex::default(),
                failures: Mutex::default(),
            }),
        }
    }

    /// Make the next call of `operation` fail with a network error.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        lock(&self.inner.failures).insert(operation, message.into());
    }

    /// Current contents of `collection`.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.inner.collections)
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Bytes uploaded at `path`.
    pub fn blob(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.inner.blobs).get(path).cloned()
    }

    /// Every uploaded blob path.
    pub fn blob_paths(&self) -> Vec<String> {
        lock(&self.inner.blobs).keys().cloned().collect()
    }

    fn check(&self, operation: Operation) -> Result<(), BackendError> {
        match lock(&self.inner.failures).remove(&operation) {
            Some(message) => Err(BackendError::Network(message)),
            None => Ok(()),
        }
    }

    /// Run `f` against `collection`, creating it if needed.
    fn with_collection<R>(&self, collection: &str, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut collections = lock(&self.inner.collections);
        f(collections.entry(collection.to_string()).or_default())
    }

    fn publish_identity(&self, identity: Option<Identity>) {
        self.inner.identity.send_replace(identity);
    }
}

#[async_trait]
impl IdentityService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        self.check(Operation::SignIn)?;
        let email = email.trim().to_lowercase();
        let identity = {
            let accounts = lock(&self.inner.accounts);
            match accounts.get(&email) {
                Some(account) if account.password == password => Identity {
                    uid: account.uid.clone(),
                    email: Some(email),
                },
                _ => return Err(BackendError::InvalidCredentials),
            }
        };
        self.publish_identity(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        self.check(Operation::SignUp)?;
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(BackendError::InvalidCredentials);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        let identity = {
            let mut accounts = lock(&self.inner.accounts);
            if accounts.contains_key(&email) {
                return Err(BackendError::EmailInUse);
            }
            let uid = uuid::Uuid::new_v4().to_string();
            accounts.insert(
                email.clone(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
            Identity {
                uid,
                email: Some(email),
            }
        };
        self.publish_identity(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.check(Operation::SignOut)?;
        self.publish_identity(None);
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.inner.identity.borrow().clone()
    }

    fn identity_changes(&self) -> IdentityStream {
        let rx = self.inner.identity.subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let identity = rx.borrow_and_update().clone();
            Some((identity, (rx, false)))
        })
        .boxed()
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        self.check(Operation::Get)?;
        Ok(self.with_collection(collection, |c| {
            c.documents.iter().find(|doc| doc.id == id).cloned()
        }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), BackendError> {
        self.check(Operation::Set)?;
        self.with_collection(collection, |c| {
            match c.documents.iter_mut().find(|doc| doc.id == id) {
                Some(doc) => doc.data = data,
                None => c.documents.push(Document::new(id, data)),
            }
            c.touch();
        });
        Ok(())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, BackendError> {
        self.check(Operation::Add)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.with_collection(collection, |c| {
            c.documents.push(Document::new(id.clone(), data));
            c.touch();
        });
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        self.check(Operation::Delete)?;
        self.with_collection(collection, |c| {
            let before = c.documents.len();
            c.documents.retain(|doc| doc.id != id);
            if c.documents.len() != before {
                c.touch();
            }
        });
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, BackendError> {
        self.check(Operation::Query)?;
        Ok(self.with_collection(collection, |c| {
            c.documents
                .iter()
                .filter(|doc| query.matches(doc))
                .cloned()
                .collect()
        }))
    }

    fn listen(&self, collection: &str) -> SnapshotStream {
        if let Err(err) = self.check(Operation::Listen) {
            return stream::once(async move { Err(err) }).boxed();
        }
        let rx = self.with_collection(collection, |c| c.version.subscribe());
        let backend = self.clone();
        let name = collection.to_string();
        stream::unfold((rx, true), move |(mut rx, first)| {
            let backend = backend.clone();
            let name = name.clone();
            async move {
                if !first {
                    rx.changed().await.ok()?;
                }
                rx.borrow_and_update();
                let snapshot = backend.documents(&name);
                Some((Ok(snapshot), (rx, false)))
            }
        })
        .boxed()
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, BackendError> {
        self.check(Operation::Upload)?;
        lock(&self.inner.blobs).insert(path.to_string(), data);
        Ok(format!("memory://{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let backend = MemoryBackend::new();
        assert!(backend.current_identity().is_none());

        let created = backend.sign_up("Ana@Example.com", "secret1").await.unwrap();
        assert_eq!(created.email.as_deref(), Some("ana@example.com"));
        assert_eq!(backend.current_identity(), Some(created.clone()));

        backend.sign_out().await.unwrap();
        assert!(backend.current_identity().is_none());

        let again = backend.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_eq!(again.uid, created.uid);
    }

    #[tokio::test]
    async fn test_credentials_are_checked() {
        let backend = MemoryBackend::new();

        let weak = backend.sign_up("ana@example.com", "123").await.unwrap_err();
        assert!(matches!(weak, BackendError::WeakPassword { min: 6 }));

        backend.sign_up("ana@example.com", "secret1").await.unwrap();
        let dup = backend.sign_up("ana@example.com", "secret2").await.unwrap_err();
        assert!(matches!(dup, BackendError::EmailInUse));

        let wrong = backend.sign_in("ana@example.com", "nope").await.unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_documents_set_add_query_delete() {
        let backend = MemoryBackend::new();

        backend.set("prefs", "u1", json!({ "foodType": "Mexican" })).await.unwrap();
        backend.set("prefs", "u1", json!({ "foodType": "Japanese" })).await.unwrap();
        let doc = backend.get("prefs", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({ "foodType": "Japanese" }));
        assert!(backend.get("prefs", "u2").await.unwrap().is_none());

        let first = backend.add("follows", json!({ "follower": "a", "followed": "b" })).await.unwrap();
        backend.add("follows", json!({ "follower": "a", "followed": "c" })).await.unwrap();
        backend.add("follows", json!({ "follower": "b", "followed": "a" })).await.unwrap();

        let by_a = backend
            .query("follows", &Query::new().where_eq("follower", "a"))
            .await
            .unwrap();
        assert_eq!(by_a.len(), 2);
        assert_eq!(by_a[0].id, first);

        backend.delete("follows", &first).await.unwrap();
        assert_eq!(backend.documents("follows").len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_hits_once() {
        let backend = MemoryBackend::new();
        backend.fail_next(Operation::Add, "offline");

        let err = backend.add("reviews", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "offline");
        assert!(backend.add("reviews", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn test_listen_yields_current_then_changes() {
        let backend = MemoryBackend::new();
        backend.set("restaurants", "r1", json!({ "name": "A" })).await.unwrap();

        let mut snapshots = backend.listen("restaurants");
        let first = snapshots.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        backend.set("restaurants", "r2", json!({ "name": "B" })).await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), snapshots.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_identity_changes_start_with_current() {
        let backend = MemoryBackend::new();
        let mut changes = backend.identity_changes();
        assert_eq!(changes.next().await, Some(None));

        backend.sign_up("ana@example.com", "secret1").await.unwrap();
        let signed_in = tokio::time::timeout(Duration::from_secs(1), changes.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signed_in.and_then(|i| i.email).as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_upload_returns_url() {
        let backend = MemoryBackend::new();
        let url = backend.upload("images/a.jpg", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "memory://images/a.jpg");
        assert_eq!(backend.blob("images/a.jpg"), Some(vec![1, 2, 3]));
    }
}
