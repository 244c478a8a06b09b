use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Preference {
    Like,
    Dislike,
    Other,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::Like => "LIKE",
            Preference::Dislike => "DISLIKE",
            Preference::Other => "OTHER",
        }
    }
}

/// A preference keyed by tag name, as used for search filters and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPreference {
    pub tag: String,
    pub preference: Preference,
}

impl TagPreference {
    pub fn new(tag: impl Into<String>, preference: Preference) -> Self {
        Self {
            tag: tag.into(),
            preference,
        }
    }
}

/// Storage for dietary preferences. Each (user, tag) pair holds at most one
/// preference.
pub trait PreferenceRepository: Send + Sync {
    fn list(&self, user: &str) -> Result<Vec<TagPreference>>;

    /// Replaces every preference of `user` with `preferences`. Later entries
    /// for the same tag override earlier ones.
    fn replace_all(&self, user: &str, preferences: &[TagPreference]) -> Result<Vec<TagPreference>>;
}

type UserPreferences = BTreeMap<String, BTreeMap<String, Preference>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    users: UserPreferences,
}

fn to_list(map: Option<&BTreeMap<String, Preference>>) -> Vec<TagPreference> {
    map.map(|entries| {
        entries
            .iter()
            .map(|(tag, preference)| TagPreference::new(tag.clone(), *preference))
            .collect()
    })
    .unwrap_or_default()
}

fn collect_preferences(preferences: &[TagPreference]) -> BTreeMap<String, Preference> {
    preferences
        .iter()
        .map(|entry| (entry.tag.clone(), entry.preference))
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    users: Mutex<UserPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_users<T>(&self, func: impl FnOnce(&mut UserPreferences) -> T) -> T {
        let mut users = self
            .users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        func(&mut users)
    }
}

impl PreferenceRepository for MemoryPreferenceStore {
    fn list(&self, user: &str) -> Result<Vec<TagPreference>> {
        Ok(self.with_users(|users| to_list(users.get(user))))
    }

    fn replace_all(&self, user: &str, preferences: &[TagPreference]) -> Result<Vec<TagPreference>> {
        Ok(self.with_users(|users| {
            let entries = collect_preferences(preferences);
            users.insert(user.to_string(), entries);
            to_list(users.get(user))
        }))
    }
}

/// Preferences persisted as a single JSON document. Every write re-reads the
/// file under a process-wide lock so concurrent requests do not lose updates.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the default location under the base directory.
    pub fn open_default() -> Self {
        Self::new(paths::preferences_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<PreferenceFile> {
        if !self.path.exists() {
            return Ok(PreferenceFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read preferences: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse preferences: {}", self.path.display()))
    }

    fn write(&self, file: &PreferenceFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create preferences directory: {}", parent.display())
            })?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write preferences: {}", self.path.display()))
    }

    fn update<T>(&self, func: impl FnOnce(&mut UserPreferences) -> T) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.read()?;
        let result = func(&mut file.users);
        self.write(&file)?;
        Ok(result)
    }
}

impl PreferenceRepository for JsonPreferenceStore {
    fn list(&self, user: &str) -> Result<Vec<TagPreference>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = self.read()?;
        Ok(to_list(file.users.get(user)))
    }

    fn replace_all(&self, user: &str, preferences: &[TagPreference]) -> Result<Vec<TagPreference>> {
        self.update(|users| {
            users.insert(user.to_string(), collect_preferences(preferences));
            to_list(users.get(user))
        })
    }
}
