pub mod backend;
pub mod error;
pub mod feed;
pub mod filter;
pub mod models;
pub mod status;

mod memory;
pub use memory::{MemoryBackend, Operation, MIN_PASSWORD_LEN};

pub use backend::{
    encode, Backend, BlobStore, Document, DocumentStore, FromDocument, IdentityService,
    IdentityStream, Query, SnapshotStream,
};
pub use error::BackendError;
pub use filter::filter_restaurants;
pub use models::{Dish, Follow, GeoPoint, Identity, Restaurant, Review, UserPreferences};
pub use status::{AuthStatus, DataState, SaveStatus};
