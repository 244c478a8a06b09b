use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::catalog::{Dish, DishId};
use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingEvent {
    pub user: String,
    pub dish_id: DishId,
    pub dish_name: String,
    pub timestamp: i64,
    pub datetime: String,
}

impl BrowsingEvent {
    pub fn now(user: &str, dish: &Dish) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            user: user.to_string(),
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            timestamp: now.unix_timestamp(),
            datetime: now.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

/// Receiver of "dish was browsed" events, one per dish match.
pub trait HistorySink: Send + Sync {
    fn record(&self, event: BrowsingEvent) -> Result<()>;

    /// Events for `user`, newest first.
    fn list(&self, user: &str) -> Result<Vec<BrowsingEvent>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    events: Vec<BrowsingEvent>,
}

/// Newest-first event log kept in one JSON file, truncated to `limit`
/// entries on every write.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            lock: Mutex::new(()),
        }
    }

    pub fn open_default(limit: usize) -> Self {
        Self::new(paths::history_path(), limit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HistoryFile> {
        if !self.path.exists() {
            return Ok(HistoryFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read history: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse history: {}", self.path.display()))
    }

    fn write(&self, file: &HistoryFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create history directory: {}", parent.display())
            })?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write history: {}", self.path.display()))
    }
}

impl HistorySink for JsonHistoryStore {
    fn record(&self, event: BrowsingEvent) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.read()?;
        file.events.insert(0, event);
        if self.limit > 0 && file.events.len() > self.limit {
            file.events.truncate(self.limit);
        }
        self.write(&file)
    }

    fn list(&self, user: &str) -> Result<Vec<BrowsingEvent>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = self.read()?;
        Ok(file
            .events
            .into_iter()
            .filter(|event| event.user == user)
            .collect())
    }
}

/// In-process history with the same newest-first bound as [`JsonHistoryStore`].
#[derive(Debug, Default)]
pub struct MemoryHistory {
    events: Mutex<Vec<BrowsingEvent>>,
    limit: usize,
}

impl MemoryHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            limit,
        }
    }
}

impl HistorySink for MemoryHistory {
    fn record(&self, event: BrowsingEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.insert(0, event);
        if self.limit > 0 && events.len() > self.limit {
            events.truncate(self.limit);
        }
        Ok(())
    }

    fn list(&self, user: &str) -> Result<Vec<BrowsingEvent>> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(events.iter().filter(|event| event.user == user).cloned().collect())
    }
}
