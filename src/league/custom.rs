use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::matcher::normalize;

/// User-editable tournament → league slug overrides, persisted as a JSON object.
///
/// Keys are kept normalized so lookups can use the classifier's normalized
/// tournament directly.
pub struct CustomMappings {
    path: PathBuf,
    entries: DashMap<String, String>,
}

impl CustomMappings {
    /// Load from `path`. A missing file starts empty; an unreadable one is
    /// logged and also starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let entries = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => {
                    for (tournament, league) in map {
                        entries.insert(normalize(&tournament), league);
                    }
                    info!("Loaded {} custom league mappings from {}", entries.len(), path.display());
                }
                Err(e) => warn!("Ignoring malformed custom mappings {}: {}", path.display(), e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read custom mappings {}: {}", path.display(), e),
        }

        Arc::new(Self { path, entries })
    }

    /// In-memory only; used by tests and tools that never persist.
    pub fn ephemeral() -> Arc<Self> {
        Arc::new(Self {
            path: PathBuf::new(),
            entries: DashMap::new(),
        })
    }

    pub fn get(&self, normalized_tournament: &str) -> Option<String> {
        self.entries.get(normalized_tournament).map(|v| v.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Merge `updates` into the table and persist it. Returns the number of entries written.
    pub async fn update(&self, updates: HashMap<String, String>) -> Result<usize> {
        let mut applied = 0;
        for (tournament, league) in updates {
            let key = normalize(&tournament);
            let league = league.trim().to_string();
            if key.is_empty() || league.is_empty() {
                continue;
            }
            self.entries.insert(key, league);
            applied += 1;
        }

        if !self.path.as_os_str().is_empty() {
            let body = serde_json::to_vec_pretty(&self.snapshot())?;
            write_atomic(&self.path, &body).await?;
        }
        info!("Updated {} custom league mappings ({} total)", applied, self.entries.len());
        Ok(applied)
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let temp_path = dir.join(format!(".{}.tmp", Uuid::new_v4()));
    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_normalizes_keys_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");

        let mappings = CustomMappings::load(&path).await;
        assert!(mappings.is_empty());

        let mut updates = HashMap::new();
        updates.insert("Liga MX - Apertura".to_string(), "mexico-liga-mx".to_string());
        updates.insert("   ".to_string(), "ignored".to_string());
        assert_eq!(mappings.update(updates).await.unwrap(), 1);
        assert_eq!(mappings.get("liga mx apertura").as_deref(), Some("mexico-liga-mx"));

        let reloaded = CustomMappings::load(&path).await;
        assert_eq!(reloaded.get("liga mx apertura").as_deref(), Some("mexico-liga-mx"));
    }

    #[tokio::test]
    async fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let mappings = CustomMappings::load(&path).await;
        assert!(mappings.is_empty());
    }
}
