use std::sync::PoisonError;

use futures::StreamExt;
use store::{filter_restaurants, Backend, DataState, Document, FromDocument, Restaurant};

use super::Synchronizer;
use crate::error::{describe, SyncError};

impl<B: Backend> Synchronizer<B> {
    /// Open the live restaurants listener, replacing any previous one.
    ///
    /// Every snapshot fully replaces the restaurant list and recomputes the
    /// filtered view. A listener error publishes `DataState::Error`; the
    /// listener is not reopened automatically.
    pub fn load_restaurants(&self) {
        self.state().restaurants.send_replace(DataState::Loading);
        self.apply_filters();

        let listener = self.clone();
        let handle = self.spawn_listener("restaurants", async move {
            listener.follow_restaurants().await
        });
        self.listeners().restaurants = Some(handle);
    }

    async fn follow_restaurants(self) {
        let collection = self.settings().collections.restaurants.clone();
        let mut snapshots = self.inner.backend.listen(&collection);
        while let Some(snapshot) = snapshots.next().await {
            let state = match snapshot {
                Ok(docs) => {
                    let restaurants = parse_restaurants(&docs);
                    tracing::debug!(count = restaurants.len(), "restaurants snapshot");
                    DataState::Success(restaurants)
                }
                Err(e) => {
                    let error = SyncError::Data(describe(&e, "Error loading restaurants"));
                    tracing::error!(%error, "restaurants listener failed");
                    DataState::Error(error.to_string())
                }
            };
            self.state().restaurants.send_replace(state);
            self.apply_filters();
        }
    }

    /// Recompute the filtered view from the latest restaurants and preferences.
    ///
    /// Without loaded restaurants or without preferences, the filtered view
    /// mirrors the raw restaurants state. Runs are serialized so a run that
    /// read older inputs never publishes after one that read newer inputs.
    pub(super) fn apply_filters(&self) {
        let _guard = self
            .inner
            .filter_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let filtered = {
            let restaurants = self.state().restaurants.borrow();
            let preferences = self.state().preferences.borrow();
            match (&*restaurants, preferences.as_ref()) {
                (DataState::Success(list), Some(preferences)) => {
                    DataState::Success(filter_restaurants(list, preferences))
                }
                (state, _) => state.clone(),
            }
        };
        self.state().filtered_restaurants.send_replace(filtered);
    }

    /// Fetch one restaurant and publish it as the selected restaurant.
    pub async fn get_restaurant(&self, id: &str) {
        let collection = &self.settings().collections.restaurants;
        match self.inner.backend.get(collection, id).await {
            Ok(Some(doc)) => match Restaurant::from_document(&doc) {
                Ok(restaurant) => {
                    self.state().selected_restaurant.send_replace(Some(restaurant));
                }
                Err(error) => tracing::warn!(id, %error, "error decoding restaurant"),
            },
            Ok(None) => {
                tracing::debug!(id, "restaurant not found");
                self.state().selected_restaurant.send_replace(None);
            }
            Err(error) => tracing::warn!(id, %error, "error fetching restaurant"),
        }
    }

    pub fn select_restaurant(&self, restaurant: Restaurant) {
        self.state().selected_restaurant.send_replace(Some(restaurant));
    }
}

/// Decode a snapshot, skipping documents that do not parse.
fn parse_restaurants(docs: &[Document]) -> Vec<Restaurant> {
    docs.iter()
        .filter_map(|doc| match Restaurant::from_document(doc) {
            Ok(restaurant) => Some(restaurant),
            Err(error) => {
                tracing::warn!(id = %doc.id, %error, "error parsing restaurant document");
                None
            }
        })
        .collect()
}
