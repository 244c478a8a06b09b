use std::path::{Path, PathBuf};

pub(crate) const BASE_DIR_ENV: &str = "MENU_LENS_DIR";
const DEFAULT_DIR_NAME: &str = ".menu-lens";

/// Root for settings and the JSON stores: `$MENU_LENS_DIR`, else
/// `~/.menu-lens`, else `.menu-lens` in the working directory.
pub(crate) fn base_dir() -> PathBuf {
    if let Some(dir) = base_dir_override() {
        return dir;
    }
    home_join(DEFAULT_DIR_NAME).unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

pub(crate) fn settings_dir() -> Option<PathBuf> {
    if let Some(dir) = base_dir_override() {
        return Some(dir);
    }
    home_join(DEFAULT_DIR_NAME)
}

pub(crate) fn preferences_path() -> PathBuf {
    base_dir().join("data").join("preferences.json")
}

pub(crate) fn history_path() -> PathBuf {
    base_dir().join("data").join("history.json")
}

/// Expands `~` and drops redundant separators from a user-supplied path.
pub(crate) fn resolve_user_path(value: &str) -> Option<PathBuf> {
    normalize_dir(value)
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV)
        .ok()
        .and_then(|value| normalize_dir(&value))
}

fn home_join(suffix: &str) -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(suffix))
        }
    })
}

fn normalize_dir(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_tilde(trimmed);
    Some(normalize_path(PathBuf::from(expanded)))
}

fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        normalized.push(component.as_os_str());
    }
    normalized
}

fn expand_tilde(value: &str) -> String {
    if value == "~" || value.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let home = home.trim();
            if home.is_empty() {
                return value.to_string();
            }
            if value == "~" {
                return home.to_string();
            }
            return format!("{}{}", home, &value[1..]);
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_base_dir;

    #[test]
    fn stores_live_under_base_dir_override() {
        with_temp_base_dir(|dir| {
            assert_eq!(base_dir(), dir);
            assert_eq!(preferences_path(), dir.join("data/preferences.json"));
            assert_eq!(history_path(), dir.join("data/history.json"));
            assert_eq!(settings_dir().as_deref(), Some(dir));
        });
    }

    #[test]
    fn user_paths_expand_tilde() {
        with_temp_base_dir(|dir| {
            let resolved = resolve_user_path("~/menus//sichuan").expect("path");
            assert_eq!(resolved, dir.join("menus/sichuan"));
            assert!(resolve_user_path("  ").is_none());
        });
    }
}
