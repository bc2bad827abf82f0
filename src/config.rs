use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// Every field falls back to a default, so the file may be absent or partial.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the raw and transformed JSON files.
    pub data_dir: Option<PathBuf>,
    /// File names inside `data_dir`.
    pub files: FilesConfig,
    /// Track catalog API settings.
    pub api: ApiConfig,
}

/// Names of the input/output files for full and trial runs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub raw_tracks: String,
    pub shows: String,
    pub test_raw_tracks: String,
    pub test_shows: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            raw_tracks: "tracks_raw.json".to_string(),
            shows: "shows.json".to_string(),
            test_raw_tracks: "tracks_raw_test.json".to_string(),
            test_shows: "shows_test.json".to_string(),
        }
    }
}

/// Track catalog API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Tracks requested per page.
    pub per_page: u32,
    /// Rate limit between API requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Distinct shows to keep when fetching in test mode.
    pub test_show_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://phish.in/api/v2".to_string(),
            per_page: 100,
            rate_limit_ms: 500,
            test_show_limit: 6,
        }
    }
}

/// Which input/output pair a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Full,
    /// Smaller trial files, for trying changes quickly.
    Test,
}

impl DataMode {
    pub fn from_flag(test: bool) -> Self {
        if test { Self::Test } else { Self::Full }
    }
}

/// Resolved file locations for one run.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub raw_tracks: PathBuf,
    pub shows: PathBuf,
}

impl AppConfig {
    /// Load config from `~/.config/showgap/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve file paths: CLI data dir > config data dir > `./data`.
    pub fn data_paths(&self, cli_data_dir: Option<&Path>, mode: DataMode) -> DataPaths {
        let dir = cli_data_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(default_data_dir);
        let (raw, shows) = match mode {
            DataMode::Full => (&self.files.raw_tracks, &self.files.shows),
            DataMode::Test => (&self.files.test_raw_tracks, &self.files.test_shows),
        };
        DataPaths {
            raw_tracks: dir.join(raw),
            shows: dir.join(shows),
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Default data directory, relative to the working directory.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
