//! # Client settings
//!
//! Collection names, the blob prefix for review photos and the preferences
//! synthesized for users who never saved any. Sources, later ones winning:
//!
//! 1. built-in defaults (the `Default` impls below);
//! 2. an optional `foodie.toml` in the working directory;
//! 3. environment variables prefixed with `FOODIE_`, nested keys joined
//!    with `__` (`FOODIE_COLLECTIONS__REVIEWS=dish_reviews`). A `.env`
//!    file is loaded first when present.
//!
//! ```toml
//! [collections]
//! restaurants = "restaurants"
//! reviews = "reviews"
//! preferences = "userPreferences"
//! follows = "follows"
//!
//! [storage]
//! image_prefix = "images"
//!
//! [defaults]
//! food_type = "Italian"
//! price_range = "$"
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use store::UserPreferences;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Collections {
    pub restaurants: String,
    pub reviews: String,
    pub preferences: String,
    pub follows: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            restaurants: "restaurants".into(),
            reviews: "reviews".into(),
            preferences: "userPreferences".into(),
            follows: "follows".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Storage {
    /// Folder review photos are uploaded under.
    pub image_prefix: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            image_prefix: "images".into(),
        }
    }
}

/// Preferences used for a user with no stored record.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Defaults {
    pub food_type: String,
    pub price_range: String,
}

impl Default for Defaults {
    fn default() -> Self {
        let fallback = UserPreferences::fallback();
        Self {
            food_type: fallback.food_type,
            price_range: fallback.price_range,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub collections: Collections,
    pub storage: Storage,
    pub defaults: Defaults,
}

impl Settings {
    /// Load from `foodie.toml` and `FOODIE_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name("foodie")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("FOODIE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse from a TOML string, without consulting the environment.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(s, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// The preferences synthesized for a user who never saved any.
    pub fn default_preferences(&self) -> UserPreferences {
        UserPreferences::new(&self.defaults.food_type, &self.defaults.price_range)
    }
}
