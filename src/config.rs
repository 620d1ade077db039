use std::env;
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_DAILY_LIMIT: u32 = 1500;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub bind_address: String,
    pub server_url: String,
    pub daily_limit: u32,
}

impl AppConfig {
    /// Stored values first, environment variables on top.
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, |name| env::var(name).ok())
    }

    pub fn resolve(
        stored: StoredConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let pick = |name: &str, fallback: Option<String>| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or(fallback.filter(|value| !value.trim().is_empty()))
        };

        let daily_limit = match pick("TICKETZERO_DAILY_LIMIT", stored.daily_limit.clone()) {
            Some(raw) => raw.parse::<u32>().map_err(|err| {
                AppError::Configuration(format!("invalid daily limit '{raw}': {err}"))
            })?,
            None => DEFAULT_DAILY_LIMIT,
        };

        Ok(Self {
            gemini_api_key: pick("GEMINI_API_KEY", stored.gemini_api_key),
            gemini_model: pick("GEMINI_MODEL", stored.gemini_model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: pick("GEMINI_BASE_URL", None)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            bind_address: pick("TICKETZERO_BIND", stored.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            server_url: pick("TICKETZERO_SERVER_URL", stored.server_url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            daily_limit,
        })
    }
}

/// Values persisted by `ticketzero config init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub daily_limit: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from("dev", "ticketzero", "ticketzero").ok_or_else(|| {
        AppError::Configuration("unable to determine a home directory".to_string())
    })
}

pub fn config_directory() -> AppResult<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_directory() -> AppResult<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
