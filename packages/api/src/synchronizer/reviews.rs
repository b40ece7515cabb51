use std::path::Path;

use futures::StreamExt;
use store::{encode, feed, Backend, BackendError, Document, FromDocument, Review};

use super::Synchronizer;
use crate::error::{describe, SyncError};

impl<B: Backend> Synchronizer<B> {
    /// Open the live reviews listener, replacing any previous one.
    ///
    /// Every snapshot fully replaces the review list and refreshes the
    /// followed feed. Listener errors are logged and the cached list kept.
    pub fn load_reviews(&self) {
        let listener = self.clone();
        let handle = self.spawn_listener("reviews", async move {
            listener.follow_reviews().await
        });
        self.listeners().reviews = Some(handle);
    }

    async fn follow_reviews(self) {
        let collection = self.settings().collections.reviews.clone();
        let mut snapshots = self.inner.backend.listen(&collection);
        while let Some(snapshot) = snapshots.next().await {
            match snapshot {
                Ok(docs) => {
                    let reviews = parse_reviews(&docs);
                    tracing::debug!(count = reviews.len(), "reviews snapshot");
                    self.state().reviews.send_replace(reviews);
                    self.refresh_followed_feed().await;
                }
                Err(error) => tracing::error!(%error, "error fetching reviews"),
            }
        }
    }

    /// Recompute the latest review of every user the signed-in user follows.
    ///
    /// Needs a signed-in identity with an email; does nothing otherwise.
    pub async fn refresh_followed_feed(&self) {
        let Some(email) = self.current_identity().and_then(|identity| identity.email) else {
            return;
        };
        match self.following(&email).await {
            Ok(following) => {
                let latest = {
                    let reviews = self.state().reviews.borrow();
                    feed::latest_per_user(&following, &reviews)
                };
                self.state().followed_feed.send_replace(latest);
            }
            Err(error) => tracing::warn!(%error, "error refreshing followed feed"),
        }
    }

    /// Save a new review, uploading `photo` first when given.
    ///
    /// A photo that cannot be read or uploaded is dropped and the review is
    /// saved without one. On success the stored review, id included, is
    /// appended to the cached list and returned.
    pub async fn add_review(&self, review: Review, photo: Option<&Path>) -> Result<Review, SyncError> {
        if self.current_identity().is_none() {
            return Err(SyncError::NotLoggedIn);
        }

        let mut review = review;
        if let Some(photo) = photo {
            review.photo_url = match self.upload_photo(photo).await {
                Ok(url) => Some(url),
                Err(error) => {
                    tracing::warn!(%error, "image upload failed, saving review without photo");
                    None
                }
            };
        }

        let collection = &self.settings().collections.reviews;
        let save = |e: BackendError| SyncError::Save(describe(&e, "Failed to add review"));
        let id = self
            .inner
            .backend
            .add(collection, encode(&review).map_err(save)?)
            .await
            .map_err(save)?;
        tracing::info!(%id, restaurant = %review.restaurant, dish = %review.dish, "review added");

        review.id = Some(id);
        self.state().reviews.send_modify(|reviews| {
            // A snapshot may already have delivered it
            if !reviews.iter().any(|r| r.id == review.id) {
                reviews.push(review.clone());
            }
        });
        Ok(review)
    }

    async fn upload_photo(&self, photo: &Path) -> Result<String, SyncError> {
        let data = tokio::fs::read(photo)
            .await
            .map_err(|e| SyncError::Upload(e.to_string()))?;
        let name = format!(
            "{}/{}.jpg",
            self.settings().storage.image_prefix,
            uuid::Uuid::new_v4()
        );
        tracing::debug!(path = %name, bytes = data.len(), "uploading image");
        self.inner
            .backend
            .upload(&name, data)
            .await
            .map_err(|e| SyncError::Upload(e.to_string()))
    }

    /// Delete a review remotely, then drop it from the cached list.
    pub async fn delete_review(&self, id: &str) -> Result<(), SyncError> {
        let collection = &self.settings().collections.reviews;
        self.inner
            .backend
            .delete(collection, id)
            .await
            .map_err(|e| SyncError::Save(describe(&e, "Failed to delete review")))?;
        tracing::info!(id, "review deleted");

        self.state()
            .reviews
            .send_modify(|reviews| reviews.retain(|r| r.id.as_deref() != Some(id)));
        Ok(())
    }

    /// Cached reviews of one dish, newest first.
    pub fn reviews_for_dish(&self, restaurant: &str, dish: &str) -> Vec<Review> {
        feed::reviews_for_dish(&self.state().reviews.borrow(), restaurant, dish)
    }

    /// Cached reviews written by `user`, newest first.
    pub fn reviews_by(&self, user: &str) -> Vec<Review> {
        feed::reviews_by(&self.state().reviews.borrow(), user)
    }

    /// Cached reviews written by the signed-in user.
    pub fn user_reviews(&self) -> Vec<Review> {
        match self.current_identity().and_then(|identity| identity.email) {
            Some(email) => self
                .state()
                .reviews
                .borrow()
                .iter()
                .filter(|review| review.user == email)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Decode a snapshot, skipping documents that do not parse.
fn parse_reviews(docs: &[Document]) -> Vec<Review> {
    docs.iter()
        .filter_map(|doc| match Review::from_document(doc) {
            Ok(review) => Some(review),
            Err(error) => {
                tracing::warn!(id = %doc.id, %error, "error parsing review document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::settings::Settings;
    use std::io::Write;
    use store::{DocumentStore, MemoryBackend, Operation};

    fn review(user: &str, dish: &str, ts: i64) -> Review {
        Review::new(user, "Trattoria", dish, 4, "Title", "Comment").at(ts)
    }

    #[tokio::test]
    async fn test_add_review_stores_and_caches() {
        let (backend, sync) = signed_in("ana@example.com").await;

        let saved = sync
            .add_review(review("ana@example.com", "Carbonara", 10), None)
            .await
            .unwrap();

        let id = saved.id.clone().unwrap();
        let stored = backend.get("reviews", &id).await.unwrap().unwrap();
        assert_eq!(Review::from_document(&stored).unwrap(), saved);
        assert_eq!(sync.reviews(), vec![saved.clone()]);
        assert_eq!(sync.user_reviews(), vec![saved]);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_add_review_requires_sign_in() {
        let backend = MemoryBackend::new();
        let sync = Synchronizer::start(backend.clone(), Settings::default());

        let err = sync
            .add_review(review("ana@example.com", "Carbonara", 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotLoggedIn));
        assert!(backend.documents("reviews").is_empty());
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_photo_is_uploaded_under_prefix() {
        let (backend, sync) = signed_in("ana@example.com").await;
        let mut photo = tempfile::NamedTempFile::new().unwrap();
        photo.write_all(b"jpeg bytes").unwrap();

        let saved = sync
            .add_review(review("ana@example.com", "Carbonara", 1), Some(photo.path()))
            .await
            .unwrap();

        let paths = backend.blob_paths();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("images/") && paths[0].ends_with(".jpg"));
        assert_eq!(backend.blob(&paths[0]).unwrap(), b"jpeg bytes");
        assert_eq!(saved.photo_url, Some(format!("memory://{}", paths[0])));
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_upload_failure_saves_review_without_photo() {
        let (backend, sync) = signed_in("ana@example.com").await;
        let mut photo = tempfile::NamedTempFile::new().unwrap();
        photo.write_all(b"jpeg bytes").unwrap();
        backend.fail_next(Operation::Upload, "quota exceeded");

        let saved = sync
            .add_review(review("ana@example.com", "Carbonara", 1), Some(photo.path()))
            .await
            .unwrap();
        assert!(saved.photo_url.is_none());
        assert_eq!(backend.documents("reviews").len(), 1);

        // An unreadable file degrades the same way
        let saved = sync
            .add_review(
                review("ana@example.com", "Tiramisu", 2),
                Some(Path::new("/definitely/not/here.jpg")),
            )
            .await
            .unwrap();
        assert!(saved.photo_url.is_none());
        assert!(backend.blob_paths().is_empty());
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_add_review_write_failure() {
        let (backend, sync) = signed_in("ana@example.com").await;
        backend.fail_next(Operation::Add, "unavailable");

        let err = sync
            .add_review(review("ana@example.com", "Carbonara", 1), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unavailable");
        assert!(sync.reviews().is_empty());
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_delete_review_removes_only_that_review() {
        let (backend, sync) = signed_in("ana@example.com").await;
        let first = sync
            .add_review(review("ana@example.com", "Carbonara", 1), None)
            .await
            .unwrap();
        let second = sync
            .add_review(review("ana@example.com", "Tiramisu", 2), None)
            .await
            .unwrap();

        sync.delete_review(first.id.as_deref().unwrap()).await.unwrap();

        assert_eq!(sync.reviews(), vec![second]);
        assert_eq!(backend.documents("reviews").len(), 1);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_cache() {
        let (backend, sync) = signed_in("ana@example.com").await;
        let saved = sync
            .add_review(review("ana@example.com", "Carbonara", 1), None)
            .await
            .unwrap();
        backend.fail_next(Operation::Delete, "offline");

        let err = sync.delete_review(saved.id.as_deref().unwrap()).await.unwrap_err();
        assert!(matches!(err, SyncError::Save(_)));
        assert_eq!(sync.reviews().len(), 1);
        sync.shutdown();
    }

    #[tokio::test]
    async fn test_listener_mirrors_reviews_and_feed() {
        let (backend, sync) = signed_in("me@example.com").await;
        for (user, dish, ts) in [
            ("a@example.com", "Carbonara", 1),
            ("a@example.com", "Tiramisu", 5),
            ("b@example.com", "Carbonara", 3),
            ("c@example.com", "Carbonara", 7),
        ] {
            backend
                .add("reviews", encode(&review(user, dish, ts)).unwrap())
                .await
                .unwrap();
        }
        sync.follow("me@example.com", "a@example.com").await.unwrap();
        sync.follow("me@example.com", "b@example.com").await.unwrap();

        sync.load_reviews();
        let mut feed = sync.subscribe_recent_reviews_from_followed();
        let latest = wait_for(&mut feed, |f| f.len() == 2).await;
        let picked: Vec<_> = latest.iter().map(|r| (r.user.as_str(), r.timestamp)).collect();
        assert_eq!(picked, [("a@example.com", 5), ("b@example.com", 3)]);

        assert_eq!(sync.reviews().len(), 4);
        assert!(sync.reviews().iter().all(|r| r.id.is_some()));
        let dish: Vec<_> = sync
            .reviews_for_dish("Trattoria", "Carbonara")
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(dish, [7, 3, 1]);
        assert_eq!(sync.reviews_by("a@example.com").len(), 2);
        sync.shutdown();
    }
}
