//! # Preference-based restaurant filtering
//!
//! A restaurant passes when **all** of the following hold:
//!
//! 1. its cuisine equals the preferred food type, ignoring case;
//! 2. its price tier equals the preferred price tier, ignoring case;
//! 3. if any allergy tags are preferred, at least one of the restaurant's
//!    allergy tags matches one of them (ignoring case); a restaurant with no
//!    allergy list never matches a non-empty preference;
//! 4. the same rule as (3) for the amenity ("other") tags.
//!
//! The filter is pure and keeps the relative order of its input.

use crate::models::{Restaurant, UserPreferences};

impl UserPreferences {
    /// Whether `restaurant` satisfies every criterion of these preferences.
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        same_text(&restaurant.cuisine, &self.food_type)
            && same_text(&restaurant.price_range, &self.price_range)
            && tags_overlap(&self.allergy_preferences, restaurant.allergies.as_deref())
            && tags_overlap(&self.other_preferences, restaurant.other.as_deref())
    }
}

/// The restaurants matching `preferences`, in their original order.
pub fn filter_restaurants(
    restaurants: &[Restaurant],
    preferences: &UserPreferences,
) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|restaurant| preferences.matches(restaurant))
        .cloned()
        .collect()
}

fn same_text(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Empty `wanted` is vacuously satisfied.
fn tags_overlap(wanted: &[String], offered: Option<&[String]>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    offered.is_some_and(|tags| {
        tags.iter()
            .any(|tag| wanted.iter().any(|want| same_text(want, tag)))
    })
}
