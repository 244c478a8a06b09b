use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog_dir: Option<PathBuf>,
    pub server_addr: String,
    pub history_enabled: bool,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            server_addr: "127.0.0.1:8710".to_string(),
            history_enabled: true,
            history_limit: 200,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    catalog: Option<CatalogSettings>,
    server: Option<ServerSettings>,
    history: Option<HistorySettings>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSettings {
    dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HistorySettings {
    enabled: Option<bool>,
    limit: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    /// Applies the keys set in `content` on top of the current values.
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(catalog) = incoming.catalog {
            if let Some(dir) = catalog.dir {
                self.catalog_dir = paths::resolve_user_path(&dir);
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr.trim().to_string();
                }
            }
        }
        if let Some(history) = incoming.history {
            if let Some(enabled) = history.enabled {
                self.history_enabled = enabled;
            }
            if let Some(limit) = history.limit {
                if limit > 0 {
                    self.history_limit = limit;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_base_dir;

    #[test]
    fn default_file_matches_defaults() {
        let mut settings = Settings::default();
        settings.merge_toml(DEFAULT_SETTINGS_TOML).expect("merge");
        assert!(settings.catalog_dir.is_none());
        assert_eq!(settings.server_addr, "127.0.0.1:8710");
        assert!(settings.history_enabled);
        assert_eq!(settings.history_limit, 200);
    }

    #[test]
    fn later_layers_override_only_their_keys() {
        let mut settings = Settings::default();
        settings
            .merge_toml("[server]\naddr = \"0.0.0.0:9000\"\n[history]\nlimit = 5\n")
            .expect("merge");
        settings
            .merge_toml("[history]\nenabled = false\nlimit = 0\n")
            .expect("merge");
        assert_eq!(settings.server_addr, "0.0.0.0:9000");
        assert!(!settings.history_enabled);
        assert_eq!(settings.history_limit, 5);
    }

    #[test]
    fn load_writes_home_file_and_reads_extra_path() {
        with_temp_base_dir(|dir| {
            let extra = dir.join("extra.toml");
            fs::write(&extra, "[catalog]\ndir = \"~/menus\"\n").expect("write extra");
            let settings = load_settings(Some(&extra)).expect("load");
            assert!(dir.join("settings.toml").exists());
            assert_eq!(settings.catalog_dir, Some(dir.join("menus")));

            let err = load_settings(Some(&dir.join("missing.toml"))).unwrap_err();
            assert!(err.to_string().starts_with("settings file not found"));
        });
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut settings = Settings::default();
        assert!(settings.merge_toml("[server\naddr = 1").is_err());
    }
}
