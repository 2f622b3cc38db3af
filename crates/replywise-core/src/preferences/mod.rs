//! User preferences: writing style and sign-off settings.
//!
//! Preferences belong to the host's settings UI; this crate only reads them,
//! fresh for every request, through a [`PreferencesStore`].

mod model;
mod store;

pub use model::{Length, MAX_PHRASES, Tone, UserPreferences};
pub use store::{
    JsonFilePreferencesStore, MemoryPreferencesStore, PREFERENCE_KEYS, PreferencesStore,
    load_preferences, save_preferences,
};
