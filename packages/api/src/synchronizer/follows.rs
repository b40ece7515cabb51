//! The follow system.
//!
//! Each operation is an independent equality query on the follows
//! collection. Nothing checks that either account still exists, and
//! following twice stores two records.

use store::{encode, Backend, BackendError, Document, Follow, FromDocument, Query};

use super::Synchronizer;
use crate::error::{describe, SyncError};

impl<B: Backend> Synchronizer<B> {
    pub async fn follow(&self, follower: &str, followed: &str) -> Result<(), SyncError> {
        let collection = &self.settings().collections.follows;
        let save = |e: BackendError| SyncError::Save(describe(&e, "Error following user"));
        let body = encode(&Follow::new(follower, followed)).map_err(save)?;
        self.inner
            .backend
            .add(collection, body)
            .await
            .map_err(save)?;
        tracing::info!(follower, followed, "followed");
        Ok(())
    }

    /// Remove every `follower → followed` record.
    pub async fn unfollow(&self, follower: &str, followed: &str) -> Result<(), SyncError> {
        let collection = &self.settings().collections.follows;
        let edges = self.edges(follower, followed).await?;
        for edge in &edges {
            self.inner
                .backend
                .delete(collection, &edge.id)
                .await
                .map_err(|e| SyncError::Save(describe(&e, "Error unfollowing user")))?;
        }
        tracing::info!(follower, followed, removed = edges.len(), "unfollowed");
        Ok(())
    }

    /// Users following `user`.
    pub async fn followers(&self, user: &str) -> Result<Vec<String>, SyncError> {
        let docs = self.find(Query::new().where_eq("followed", user)).await?;
        Ok(decode_follows(&docs).map(|f| f.follower).collect())
    }

    /// Users `user` follows.
    pub async fn following(&self, user: &str) -> Result<Vec<String>, SyncError> {
        let docs = self.find(Query::new().where_eq("follower", user)).await?;
        Ok(decode_follows(&docs).map(|f| f.followed).collect())
    }

    pub async fn is_following(&self, follower: &str, followed: &str) -> Result<bool, SyncError> {
        Ok(!self.edges(follower, followed).await?.is_empty())
    }

    async fn edges(&self, follower: &str, followed: &str) -> Result<Vec<Document>, SyncError> {
        self.find(
            Query::new()
                .where_eq("follower", follower)
                .where_eq("followed", followed),
        )
        .await
    }

    async fn find(&self, query: Query) -> Result<Vec<Document>, SyncError> {
        let collection = &self.settings().collections.follows;
        self.inner
            .backend
            .query(collection, &query)
            .await
            .map_err(|e| SyncError::Data(describe(&e, "Error fetching follows")))
    }
}

/// Decode follow records, skipping malformed ones.
fn decode_follows(docs: &[Document]) -> impl Iterator<Item = Follow> + '_ {
    docs.iter().filter_map(|doc| match Follow::from_document(doc) {
        Ok(follow) => Some(follow),
        Err(error) => {
            tracing::warn!(id = %doc.id, %error, "skipping malformed follow record");
            None
        }
    })
}
