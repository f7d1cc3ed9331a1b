use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::motion::{SENSITIVITY_MAX, SENSITIVITY_MIN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub scramble_length: usize,
    pub hold_delay_ms: u64,
    pub sensitivity: u16,
    pub cooldown_ms: u64,
    pub still_duration_ms: u64,
    pub auto_advance: bool,
    pub input_mode: String,
    pub motion_policy: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scramble_length: 20,
            hold_delay_ms: 350,
            sensitivity: 100,
            cooldown_ms: 600,
            still_duration_ms: 300,
            auto_advance: false,
            input_mode: "manual".to_string(),
            motion_policy: "impact".to_string(),
        }
    }
}

impl Config {
    /// Clamp persisted values into their legal ranges; a hand-edited file
    /// must not produce a dead filter.
    pub fn sanitized(mut self) -> Self {
        self.sensitivity = self.sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);
        if self.scramble_length == 0 {
            self.scramble_length = 20;
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("kubik_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg.sanitized();
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            scramble_length: 25,
            hold_delay_ms: 400,
            sensitivity: 150,
            cooldown_ms: 800,
            still_duration_ms: 250,
            auto_advance: true,
            input_mode: "motion".into(),
            motion_policy: "pickup".into(),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn corrupt_config_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"]]]").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn sanitize_clamps_sensitivity() {
        let cfg = Config {
            sensitivity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.sanitized().sensitivity, SENSITIVITY_MIN);
        let cfg = Config {
            sensitivity: 9999,
            ..Config::default()
        };
        assert_eq!(cfg.sanitized().sensitivity, SENSITIVITY_MAX);
    }
}
