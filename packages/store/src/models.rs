//! # Domain models for restaurants, reviews, preferences and follows
//!
//! Defines the records mirrored from the backend's document collections.
//! Every type is `Serialize + Deserialize` so it can be written to and read
//! from a [`crate::Document`] body. Field names follow the backend's stored
//! naming (`priceRange`, `imageUrl`, `photoUrl`, ...), and missing fields
//! decode to their defaults, so partially filled documents still load.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Restaurant`] | A read-only restaurant document: cuisine, price tier, location, rating, its [`Dish`] list and optional allergy / amenity tags. The `id` is the document id and is never part of the stored body. |
//! | [`Dish`] | A dish owned by its restaurant. No identity of its own. |
//! | [`Review`] | A dish review authored by a user. Created and deleted, never edited in place. |
//! | [`UserPreferences`] | The single per-user record driving restaurant filtering. Saved wholesale. |
//! | [`Follow`] | One `follower → followed` edge. |
//! | [`Identity`] | The account the identity service reports as signed in. |

use serde::{Deserialize, Serialize};

use crate::backend::{Document, FromDocument};
use crate::error::BackendError;

/// A geographic coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A dish on a restaurant's menu.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dish {
    pub name: String,
    /// Star rating as stored; see [`Dish::stars`] for the clamped value.
    pub rating: i32,
    pub image_url: String,
    pub price: f64,
    pub is_recommended: Option<bool>,
}

impl Dish {
    /// Star rating clamped to `0..=5`.
    pub fn stars(&self) -> u8 {
        self.rating.clamp(0, 5) as u8
    }

    /// Whether the restaurant recommends this dish. A missing flag means no.
    pub fn is_recommended(&self) -> bool {
        self.is_recommended.unwrap_or(false)
    }
}

/// A restaurant document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Restaurant {
    /// Document id, filled in on decode.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// Cuisine, matched against [`UserPreferences::food_type`].
    pub cuisine: String,
    pub image_url: String,
    /// Price tier such as `"$"` or `"$$"`.
    pub price_range: String,
    pub location: GeoPoint,
    /// Display distance as stored by the backend ("1.2 km").
    pub distance: String,
    pub rating: f64,
    pub dishes: Vec<Dish>,
    #[serde(rename = "Allergies", skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    /// Amenity tags ("Takeout", "Outdoor Seating", ...).
    #[serde(rename = "Other", skip_serializing_if = "Option::is_none")]
    pub other: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Restaurant {
    /// Dishes flagged as recommended, in menu order.
    pub fn recommended_dishes(&self) -> impl Iterator<Item = &Dish> {
        self.dishes.iter().filter(|dish| dish.is_recommended())
    }

    /// Every dish not flagged as recommended, in menu order.
    pub fn other_dishes(&self) -> impl Iterator<Item = &Dish> {
        self.dishes.iter().filter(|dish| !dish.is_recommended())
    }

    /// Look up a dish by exact name.
    pub fn dish(&self, name: &str) -> Option<&Dish> {
        self.dishes.iter().find(|dish| dish.name == name)
    }
}

impl FromDocument for Restaurant {
    fn from_document(doc: &Document) -> Result<Self, BackendError> {
        let mut restaurant: Restaurant = doc.decode()?;
        restaurant.id = doc.id.clone();
        Ok(restaurant)
    }
}

/// A review of one dish at one restaurant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Review {
    /// Assigned by the store on creation, `None` until then.
    #[serde(skip)]
    pub id: Option<String>,
    /// Author, identified by email.
    pub user: String,
    pub restaurant: String,
    pub dish: String,
    pub rating: i32,
    pub comment: String,
    pub title: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Review {
    /// A new, unsaved review stamped with the current time.
    pub fn new(
        user: impl Into<String>,
        restaurant: impl Into<String>,
        dish: impl Into<String>,
        rating: i32,
        title: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            user: user.into(),
            restaurant: restaurant.into(),
            dish: dish.into(),
            rating,
            comment: comment.into(),
            title: title.into(),
            timestamp: now_millis(),
            photo_url: None,
        }
    }

    /// Builder method to set the creation timestamp.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl FromDocument for Review {
    fn from_document(doc: &Document) -> Result<Self, BackendError> {
        let mut review: Review = doc.decode()?;
        review.id = Some(doc.id.clone());
        Ok(review)
    }
}

/// Filtering criteria stored once per user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub food_type: String,
    pub price_range: String,
    pub allergy_preferences: Vec<String>,
    pub other_preferences: Vec<String>,
    pub date: String,
}

impl UserPreferences {
    pub fn new(food_type: impl Into<String>, price_range: impl Into<String>) -> Self {
        Self {
            food_type: food_type.into(),
            price_range: price_range.into(),
            ..Self::default()
        }
    }

    /// Preferences used when a user has never saved any: Italian, `"$"`, no tags.
    pub fn fallback() -> Self {
        Self::new("Italian", "$")
    }

    /// Builder method to set the allergy tags.
    pub fn with_allergies<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergy_preferences = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the amenity tags.
    pub fn with_other<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.other_preferences = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl FromDocument for UserPreferences {
    fn from_document(doc: &Document) -> Result<Self, BackendError> {
        doc.decode()
    }
}

/// A follow edge between two users, both identified by email.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Follow {
    pub follower: String,
    pub followed: String,
    pub timestamp: i64,
}

impl Follow {
    pub fn new(follower: impl Into<String>, followed: impl Into<String>) -> Self {
        Self {
            follower: follower.into(),
            followed: followed.into(),
            timestamp: now_millis(),
        }
    }
}

impl FromDocument for Follow {
    fn from_document(doc: &Document) -> Result<Self, BackendError> {
        doc.decode()
    }
}

/// A signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restaurant_decodes_stored_field_names() {
        let doc = Document::new(
            "r1",
            json!({
                "name": "Trattoria",
                "cuisine": "Italian",
                "priceRange": "$$",
                "location": { "latitude": 40.4, "longitude": -3.7 },
                "rating": 4.5,
                "Allergies": ["Gluten-Free"],
                "Other": ["Takeout"],
                "dishes": [
                    { "name": "Carbonara", "rating": 5, "price": 12.5, "isRecommended": true },
                    { "name": "Tiramisu", "rating": 9 }
                ]
            }),
        );

        let restaurant = Restaurant::from_document(&doc).unwrap();
        assert_eq!(restaurant.id, "r1");
        assert_eq!(restaurant.price_range, "$$");
        assert_eq!(restaurant.location, GeoPoint::new(40.4, -3.7));
        assert_eq!(restaurant.allergies, Some(vec!["Gluten-Free".to_string()]));
        assert_eq!(restaurant.other, Some(vec!["Takeout".to_string()]));
        assert!(restaurant.website.is_none());

        // Missing flag counts as not recommended; rating clamps to five stars
        let names: Vec<_> = restaurant.other_dishes().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Tiramisu"]);
        assert_eq!(restaurant.dish("Tiramisu").unwrap().stars(), 5);
        assert_eq!(restaurant.recommended_dishes().count(), 1);
    }

    #[test]
    fn test_review_id_is_not_stored() {
        let mut review = Review::new("a@x.com", "Trattoria", "Carbonara", 4, "Good", "Creamy");
        review.id = Some("local".to_string());

        let body = serde_json::to_value(&review).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("photoUrl").is_none());

        let decoded = Review::from_document(&Document::new("stored", body)).unwrap();
        assert_eq!(decoded.id.as_deref(), Some("stored"));
        assert_eq!(decoded.dish, "Carbonara");
    }

    #[test]
    fn test_preferences_fallback() {
        let prefs = UserPreferences::fallback();
        assert_eq!(prefs.food_type, "Italian");
        assert_eq!(prefs.price_range, "$");
        assert!(prefs.allergy_preferences.is_empty());
        assert!(prefs.other_preferences.is_empty());
        assert_eq!(prefs.date, "");
    }
}
