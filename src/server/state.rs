use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::catalog::{Catalog, DishId};
use crate::history::{BrowsingEvent, HistorySink};
use crate::preferences::PreferenceRepository;
use crate::settings;

pub(crate) struct ServerState {
    pub(crate) settings: settings::Settings,
    catalog: RwLock<Arc<Catalog>>,
    pub(crate) preferences: Arc<dyn PreferenceRepository>,
    pub(crate) history: Option<Arc<dyn HistorySink>>,
}

impl ServerState {
    pub(crate) fn new(
        settings: settings::Settings,
        catalog: Catalog,
        preferences: Arc<dyn PreferenceRepository>,
        history: Option<Arc<dyn HistorySink>>,
    ) -> Self {
        Self {
            settings,
            catalog: RwLock::new(Arc::new(catalog)),
            preferences,
            history,
        }
    }

    /// The current catalog. The returned snapshot stays valid after a reload.
    pub(crate) fn snapshot(&self) -> Arc<Catalog> {
        let guard = self
            .catalog
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub(crate) fn replace_catalog(&self, catalog: Catalog) {
        let mut guard = self
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(catalog);
    }

    /// Records one browsing event per dish on a blocking task. Failures are
    /// logged; callers may drop the handle.
    pub(crate) fn record_browsing(
        &self,
        catalog: &Catalog,
        user: &str,
        dishes: &[DishId],
    ) -> Option<JoinHandle<()>> {
        let history = self.history.clone()?;
        let events = dishes
            .iter()
            .filter_map(|id| catalog.dish(*id))
            .map(|dish| BrowsingEvent::now(user, dish))
            .collect::<Vec<_>>();
        if events.is_empty() {
            return None;
        }
        Some(tokio::task::spawn_blocking(move || {
            for event in events {
                let dish_id = event.dish_id;
                if let Err(err) = history.record(event) {
                    warn!("history: failed to record dish {}: {:#}", dish_id, err);
                }
            }
        }))
    }
}
