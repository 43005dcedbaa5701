//! Storage adapters for the GoAffPro SDK

use async_trait::async_trait;
use std::collections::HashMap;
#[cfg(feature = "native-storage")]
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::{GoaffproError, Result};

/// Storage keys.
///
/// These names are shared with the other GoAffPro SDKs and must not change
/// between versions.
pub mod keys {
    pub const REF: &str = "@ref";
    pub const REF_TIME: &str = "@refTime";
    pub const VISIT_ID: &str = "@gfp_v_id";
    pub const AFFILIATE_ID: &str = "@affiliate_id";
}

/// Storage adapter trait for custom storage implementations.
///
/// Failures are returned as values; the SDK logs them and carries on as if
/// the key were absent.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value by key
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value by key
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage adapter. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

/// File-based storage adapter
///
/// Stores referral state in `goaffpro.json` within the specified directory.
/// The whole map is rewritten on every change.
#[cfg(feature = "native-storage")]
pub struct FileStorage {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

#[cfg(feature = "native-storage")]
impl FileStorage {
    /// Open file storage in the given directory.
    ///
    /// The directory is created if needed. A missing or unreadable
    /// `goaffpro.json` starts out empty.
    pub async fn open(storage_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(storage_dir).await.map_err(|e| {
            GoaffproError::storage(format!("Failed to create storage directory: {}", e))
        })?;

        let path = storage_dir.join("goaffpro.json");

        let cache = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt storage file");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(GoaffproError::storage(e.to_string())),
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, cache: &HashMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(cache)
            .map_err(|e| GoaffproError::storage(e.to_string()))?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| GoaffproError::storage(e.to_string()))
    }
}

#[cfg(feature = "native-storage")]
#[async_trait]
impl StorageAdapter for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value.to_string());
        self.save(&cache).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        if cache.remove(key).is_none() {
            return Ok(());
        }
        self.save(&cache).await
    }
}

#[cfg(feature = "native-storage")]
impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .finish()
    }
}
