use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::config::data_directory;
use crate::error::{AppError, AppResult};
use crate::services::LocalStorage;

const STORAGE_FILE_NAME: &str = "local_storage.json";

/// JSON file of string pairs, rewritten on every `set_item`.
pub struct FileStorage {
    file_path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn load() -> AppResult<Self> {
        Self::open(data_directory()?.join(STORAGE_FILE_NAME))
    }

    /// Opens the store at `file_path`. An unreadable JSON document starts
    /// an empty store; the next write replaces it.
    pub fn open(file_path: PathBuf) -> AppResult<Self> {
        let items = match fs::read_to_string(&file_path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(
                        path = %file_path.display(),
                        error = %err,
                        "local storage file is corrupt; starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self {
            file_path,
            items: Mutex::new(items),
        })
    }

    fn items(&self) -> AppResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| AppError::Configuration("local storage lock poisoned".to_string()))
    }

    fn save(&self, items: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(items).map_err(|err| {
            AppError::Configuration(format!("failed to write local storage: {err}"))
        })?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        let mut items = self.items()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }
}
