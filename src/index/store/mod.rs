// Collection persistence
// One directory per store under the stores root, holding a versioned JSON
// manifest with vectors, chunk texts, and metadata for exact reload


use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::index::{Collection, DistanceMetric, IndexEntry};
use crate::{Result, TextQaError};

const MANIFEST_FILE: &str = "collection.json";
const FORMAT_VERSION: u32 = 1;

/// Persisted form of a collection. Self-describing: the format version and
/// per-entry dimensions let `load` tell corruption apart from absence.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    name: String,
    metric: DistanceMetric,
    dimension: usize,
    created_at: String,
    entries: Vec<IndexEntry>,
}

/// Summary of a persisted store, as reported by [`StoreManager::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub name: String,
    pub entries: usize,
}

/// Saves, loads, lists, and deletes persisted collections under a stores
/// directory. Each store is keyed by collection name.
#[derive(Debug, Clone)]
pub struct StoreManager {
    stores_dir: PathBuf,
}

impl StoreManager {
    #[inline]
    pub fn new(stores_dir: impl Into<PathBuf>) -> Self {
        Self {
            stores_dir: stores_dir.into(),
        }
    }

    #[inline]
    pub fn stores_dir(&self) -> &Path {
        &self.stores_dir
    }

    /// Persist a collection, replacing any previous contents of its store.
    /// The manifest is written to a temporary file and renamed into place so
    /// a crash cannot leave a half-written manifest behind.
    #[inline]
    pub fn save(&self, collection: &Collection) -> Result<PathBuf> {
        validate_store_name(collection.name())?;

        let store_dir = self.stores_dir.join(collection.name());
        fs::create_dir_all(&store_dir)?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            name: collection.name().to_string(),
            metric: collection.metric(),
            dimension: collection.dimension(),
            created_at: Utc::now().to_rfc3339(),
            entries: collection.entries.clone(),
        };

        let content = serde_json::to_string(&manifest)
            .map_err(|e| TextQaError::InvalidInput(format!("failed to serialize store: {}", e)))?;

        let manifest_path = store_dir.join(MANIFEST_FILE);
        let tmp_path = store_dir.join(format!("{}.tmp", MANIFEST_FILE));
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &manifest_path)?;

        info!(
            "Saved collection '{}' ({} entries) to {}",
            collection.name(),
            collection.len(),
            manifest_path.display()
        );

        Ok(manifest_path)
    }

    /// Load a persisted collection by store name.
    ///
    /// A missing store fails with [`TextQaError::StoreNotFound`]; an
    /// unreadable, unparseable, or invariant-violating manifest fails with
    /// [`TextQaError::StoreCorrupt`]. An empty collection is never returned
    /// silently.
    #[inline]
    pub fn load(&self, name: &str) -> Result<Collection> {
        validate_store_name(name)?;

        let manifest_path = self.stores_dir.join(name).join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(TextQaError::StoreNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&manifest_path).map_err(|e| TextQaError::StoreCorrupt {
            name: name.to_string(),
            reason: format!("failed to read manifest: {}", e),
        })?;

        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| TextQaError::StoreCorrupt {
                name: name.to_string(),
                reason: format!("failed to parse manifest: {}", e),
            })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(TextQaError::StoreCorrupt {
                name: name.to_string(),
                reason: format!(
                    "unsupported format version {} (expected {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            });
        }

        debug!(
            "Loaded store '{}' with {} entries ({} dimensions)",
            name,
            manifest.entries.len(),
            manifest.dimension
        );

        Collection::from_parts(
            manifest.name,
            manifest.dimension,
            manifest.metric,
            manifest.entries,
        )
    }

    /// Whether a store with this name has been persisted.
    #[inline]
    pub fn exists(&self, name: &str) -> bool {
        self.stores_dir.join(name).join(MANIFEST_FILE).exists()
    }

    /// List persisted stores in name order. Stores whose manifests cannot be
    /// read are skipped with a warning rather than failing the listing.
    #[inline]
    pub fn list(&self) -> Result<Vec<StoreInfo>> {
        if !self.stores_dir.exists() {
            return Ok(Vec::new());
        }

        let mut stores = Vec::new();
        for dir_entry in fs::read_dir(&self.stores_dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.path().is_dir() {
                continue;
            }

            let name = dir_entry.file_name().to_string_lossy().into_owned();
            match self.load(&name) {
                Ok(collection) => stores.push(StoreInfo {
                    name,
                    entries: collection.len(),
                }),
                Err(TextQaError::StoreNotFound(_)) => {
                    // Directory without a manifest, not one of ours.
                }
                Err(e) => warn!("Skipping unreadable store '{}': {}", name, e),
            }
        }

        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    /// Delete a persisted store and everything in its directory.
    #[inline]
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_store_name(name)?;

        let store_dir = self.stores_dir.join(name);
        if !store_dir.exists() {
            return Err(TextQaError::StoreNotFound(name.to_string()));
        }

        fs::remove_dir_all(&store_dir)?;
        info!("Deleted store '{}'", name);
        Ok(())
    }
}

/// Store names become directory names, so they must be plain path segments.
fn validate_store_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TextQaError::InvalidInput(
            "store name must not be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(TextQaError::InvalidInput(format!(
            "store name '{}' must not contain path separators",
            name
        )));
    }
    Ok(())
}
