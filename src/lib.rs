//! Matches OCR output and free-text queries against a dish catalog.
//!
//! The engine is synchronous and read-only over a [`catalog::Catalog`]
//! snapshot: [`matcher::match_line`] maps recognized lines to dishes and tags
//! with pixel bounding boxes, and [`search::search`] ranks dishes for a query
//! under like/dislike tag preferences. The binary wraps both in a CLI and an
//! HTTP service.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub mod catalog;
pub mod history;
pub mod logging;
pub mod matcher;
pub mod ocr;
mod paths;
pub mod preferences;
pub mod script;
pub mod search;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;

use catalog::{Catalog, DishId, EntryRef};
use history::{BrowsingEvent, HistorySink, JsonHistoryStore};
use matcher::MatchResult;
use ocr::RecognizedLine;
use preferences::{JsonPreferenceStore, Preference, PreferenceRepository, TagPreference};
use settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub catalog_dir: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Serve {
        addr: Option<String>,
    },
    Recognize {
        path: PathBuf,
        user: Option<String>,
    },
    Search {
        query: String,
        likes: Vec<String>,
        dislikes: Vec<String>,
        user: Option<String>,
    },
    SearchTags {
        tags: Vec<String>,
    },
    Histories {
        user: String,
    },
    /// Lists a user's stored preferences, or replaces them when any tag is given.
    Preferences {
        user: String,
        likes: Vec<String>,
        dislikes: Vec<String>,
        others: Vec<String>,
    },
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(dir) = config.catalog_dir.as_deref() {
        settings.catalog_dir = paths::resolve_user_path(dir);
    }

    match config.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| settings.server_addr.clone());
            server::run_server(settings, addr).await?;
            Ok(String::new())
        }
        command => execute(&settings, command),
    }
}

/// Runs a one-shot command against the catalog named by `settings`.
pub fn execute(settings: &Settings, command: Command) -> Result<String> {
    let catalog = catalog::load_catalog(settings.catalog_dir.as_deref())?;
    match command {
        Command::Serve { .. } => Err(anyhow!("serve is not a one-shot command")),
        Command::Recognize { path, user } => {
            let lines = read_recognized_lines(&path)?;
            let found = matcher::match_lines(catalog.index(), &lines);
            if let Some(user) = non_empty(user.as_deref())
                && settings.history_enabled
            {
                let store = JsonHistoryStore::open_default(settings.history_limit);
                if let Err(err) = record_dish_matches(&store, &catalog, user, &found) {
                    warn!("history: failed to record matches for {}: {:#}", user, err);
                }
            }
            Ok(format_matches(&catalog, &found))
        }
        Command::Search {
            query,
            likes,
            dislikes,
            user,
        } => {
            let mut filters = tag_preferences(likes, dislikes, Vec::new());
            if filters.is_empty()
                && let Some(user) = non_empty(user.as_deref())
            {
                filters = JsonPreferenceStore::open_default().list(user)?;
            }
            let ids = search::search(&catalog, &query, &filters);
            Ok(format_dishes(&catalog, &ids))
        }
        Command::SearchTags { tags } => {
            let ids = search::search_by_tags(&catalog, &tags);
            Ok(format_dishes(&catalog, &ids))
        }
        Command::Histories { user } => {
            let store = JsonHistoryStore::open_default(settings.history_limit);
            let events = store.list(user.trim())?;
            Ok(format_histories(&events))
        }
        Command::Preferences {
            user,
            likes,
            dislikes,
            others,
        } => {
            let user = non_empty(Some(user.as_str())).ok_or_else(|| anyhow!("user is empty"))?;
            let store = JsonPreferenceStore::open_default();
            let entries = tag_preferences(likes, dislikes, others);
            if entries.is_empty() {
                return Ok(format_preferences(&store.list(user)?));
            }
            if let Some(unknown) = entries
                .iter()
                .find(|entry| catalog.tag_by_name(&entry.tag).is_none())
            {
                return Err(anyhow!("unknown tag: {}", unknown.tag));
            }
            Ok(format_preferences(&store.replace_all(user, &entries)?))
        }
    }
}

fn tag_preferences(
    likes: Vec<String>,
    dislikes: Vec<String>,
    others: Vec<String>,
) -> Vec<TagPreference> {
    let tagged = |tags: Vec<String>, preference: Preference| {
        tags.into_iter().map(move |tag| TagPreference::new(tag, preference))
    };
    tagged(likes, Preference::Like)
        .chain(tagged(dislikes, Preference::Dislike))
        .chain(tagged(others, Preference::Other))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Reads either an OCR.space response object or a JSON array of lines.
pub fn read_recognized_lines(path: &Path) -> Result<Vec<RecognizedLine>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read OCR input: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse OCR input: {}", path.display()))?;
    parse_recognized_lines(value)
}

pub fn parse_recognized_lines(value: Value) -> Result<Vec<RecognizedLine>> {
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).with_context(|| "invalid recognized lines")
        }
        Value::Object(_) => Ok(ocr::parse_ocr_space_response(&value)?),
        _ => Err(anyhow!(
            "OCR input must be an OCR response object or an array of lines"
        )),
    }
}

fn record_dish_matches(
    sink: &dyn HistorySink,
    catalog: &Catalog,
    user: &str,
    found: &[Vec<MatchResult>],
) -> Result<()> {
    for result in found.iter().flatten() {
        let EntryRef::Dish(id) = result.entry else {
            continue;
        };
        if let Some(dish) = catalog.dish(id) {
            sink.record(BrowsingEvent::now(user, dish))?;
        }
    }
    Ok(())
}

/// One tab-separated row per match: line, text, entry, display name, box.
pub fn format_matches(catalog: &Catalog, found: &[Vec<MatchResult>]) -> String {
    let mut rows = Vec::new();
    for (line_idx, matches) in found.iter().enumerate() {
        for result in matches {
            let display = match result.entry {
                EntryRef::Dish(id) => catalog.dish(id).map(|dish| dish.display_name()),
                EntryRef::Tag(id) => catalog.tag(id).map(|tag| tag.display_name()),
            }
            .unwrap_or("?");
            let bbox = &result.bounding_box;
            rows.push(format!(
                "{}\t{}\t{}:{}\t{}\t({},{})-({},{})",
                line_idx,
                result.text,
                result.entry.kind(),
                result.entry.id(),
                display,
                bbox.top_left.x,
                bbox.top_left.y,
                bbox.bottom_right.x,
                bbox.bottom_right.y
            ));
        }
    }
    if rows.is_empty() {
        "no matches".to_string()
    } else {
        rows.join("\n")
    }
}

pub fn format_dishes(catalog: &Catalog, ids: &[DishId]) -> String {
    if ids.is_empty() {
        return "no dishes".to_string();
    }
    ids.iter()
        .filter_map(|id| catalog.dish(*id))
        .map(|dish| format!("{}\t{}\t{}", dish.id, dish.name, dish.name_en))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_preferences(entries: &[TagPreference]) -> String {
    if entries.is_empty() {
        return "no preferences".to_string();
    }
    entries
        .iter()
        .map(|entry| format!("{}\t{}", entry.tag, entry.preference.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_histories(events: &[BrowsingEvent]) -> String {
    if events.is_empty() {
        return "no histories".to_string();
    }
    events
        .iter()
        .map(|event| format!("{}\t{}\t{}", event.datetime, event.dish_id, event.dish_name))
        .collect::<Vec<_>>()
        .join("\n")
}
