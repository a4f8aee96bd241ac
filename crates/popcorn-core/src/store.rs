use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Durable key/value storage for small JSON documents.
///
/// Reads and writes are synchronous; values are small enough that blocking
/// the caller is fine.
pub trait PersistentStore: Send + Sync {
    /// `Ok(None)` when the key was never written or its content is unreadable.
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&self, key: &str, value: &Value) -> Result<()>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl PersistentStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);

        if !path.exists() {
            debug!("Store miss: {} (file does not exist)", key);
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read store file for {}: {}", key, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => {
                debug!("Store hit: {}", key);
                Ok(Some(value))
            }
            Err(e) => {
                // Leave the file in place so the user can recover it by hand
                warn!("Store file for {} is not valid JSON: {}", key, e);
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", key, e))?;

        // Write then rename so a crash never leaves a half-written list behind
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| anyhow!("Failed to write {}: {}", tmp.display(), e))?;
        std::fs::rename(&tmp, &path).map_err(|e| anyhow!("Failed to replace {}: {}", path.display(), e))?;

        debug!("Store saved: {}", key);
        Ok(())
    }
}

/// Process-local store, used for `--ephemeral` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}
