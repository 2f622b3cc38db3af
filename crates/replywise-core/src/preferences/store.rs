//! Preference storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::UserPreferences;
use crate::{Error, Result};

/// Keys read for [`UserPreferences`].
pub const PREFERENCE_KEYS: [&str; 5] = ["display_name", "greetings", "closings", "tone", "length"];

/// Namespaced key-value store for preferences.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Reads the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Writes every entry of `record`, keeping other keys.
    async fn set(&self, record: Map<String, Value>) -> Result<()>;
}

/// Loads preferences, falling back to defaults for missing keys.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a stored value has the
/// wrong shape.
pub async fn load_preferences(store: &dyn PreferencesStore) -> Result<UserPreferences> {
    let record = store.get(&PREFERENCE_KEYS).await?;
    let prefs: UserPreferences = serde_json::from_value(Value::Object(record))?;
    Ok(prefs.normalized())
}

/// Saves preferences.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub async fn save_preferences(store: &dyn PreferencesStore, prefs: &UserPreferences) -> Result<()> {
    match serde_json::to_value(prefs.clone().normalized())? {
        Value::Object(record) => store.set(record).await,
        _ => Err(Error::Preferences("preferences did not serialize to an object".into())),
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryPreferencesStore {
    values: RwLock<Map<String, Value>>,
}

impl MemoryPreferencesStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `prefs`.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefs` cannot be serialised.
    pub fn with_preferences(prefs: &UserPreferences) -> Result<Self> {
        let Value::Object(values) = serde_json::to_value(prefs)? else {
            return Err(Error::Preferences("preferences did not serialize to an object".into()));
        };
        Ok(Self {
            values: RwLock::new(values),
        })
    }
}

#[async_trait]
impl PreferencesStore for MemoryPreferencesStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let values = self.values.read().await;
        Ok(pick(&values, keys))
    }

    async fn set(&self, record: Map<String, Value>) -> Result<()> {
        self.values.write().await.extend(record);
        Ok(())
    }
}

/// JSON file store. Each store owns one namespace (a top-level object key),
/// so several components can share a file.
#[derive(Debug, Clone)]
pub struct JsonFilePreferencesStore {
    path: PathBuf,
    namespace: String,
}

impl JsonFilePreferencesStore {
    /// Creates a store backed by `path` under `namespace`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    /// Store at the platform config directory:
    /// `<config>/replywise/preferences.json`, namespace `replywise`.
    #[must_use]
    pub fn default_location() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("replywise")
            .join("preferences.json");
        Self::new(path, "replywise")
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<Map<String, Value>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Preferences(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl PreferencesStore for JsonFilePreferencesStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let file = self.read_file().await?;
        let record = match file.get(&self.namespace) {
            Some(Value::Object(namespace)) => pick(namespace, keys),
            _ => Map::new(),
        };
        debug!(
            "Loaded {} preference keys from {:?}",
            record.len(),
            self.path
        );
        Ok(record)
    }

    async fn set(&self, record: Map<String, Value>) -> Result<()> {
        let mut file = self.read_file().await?;
        let entry = file
            .entry(self.namespace.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(namespace) = entry {
            namespace.extend(record);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&Value::Object(file))?;
        tokio::fs::write(&self.path, contents).await?;

        info!("Preferences saved to {:?}", self.path);
        Ok(())
    }
}

fn pick(values: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|&key| values.get(key).map(|v| (key.to_string(), v.clone())))
        .collect()
}
