use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;

pub const TOKEN_KEY: &str = "token";
pub const WALLET_KEY: &str = "walletAddress";

/// String key-value state in a JSON file, written on every mutation.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Store {
    pub fn default_path() -> PathBuf {
        let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        config.join("carbon-credit").join("state.json")
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened state file");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}
