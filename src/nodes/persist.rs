//! Persistence hook for the node store.
//!
//! The store itself never touches disk; it calls a [`NodePersistence`]
//! implementation per entity update. The JSON file cache here is the default
//! implementation; callers with a real database supply their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::NodeEntity;
use crate::link::packet::NodeId;

/// Upsert-by-node-id contract. `first_seen` must survive upserts; `load_all`
/// returns entities ordered by `last_heard`, most recent first.
pub trait NodePersistence: Send + Sync {
    fn upsert(&self, entity: &NodeEntity) -> Result<()>;
    fn load_all(&self) -> Result<Vec<NodeEntity>>;
    fn clear(&self) -> Result<()>;
}

/// No-op persistence for callers that keep the node model in memory only.
#[derive(Debug, Default)]
pub struct NullPersistence;

impl NodePersistence for NullPersistence {
    fn upsert(&self, _entity: &NodeEntity) -> Result<()> {
        Ok(())
    }
    fn load_all(&self) -> Result<Vec<NodeEntity>> {
        Ok(Vec::new())
    }
    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    nodes: HashMap<NodeId, NodeEntity>,
    last_updated: DateTime<Utc>,
}

/// JSON file cache keyed by node id. Every upsert rewrites the file; loads
/// are tolerant of corruption (log and start fresh) so a bad cache never
/// takes the pipeline down.
pub struct JsonNodeCache {
    path: PathBuf,
    nodes: Mutex<HashMap<NodeId, NodeEntity>>,
}

impl JsonNodeCache {
    /// Open the cache at `path`, loading existing contents when present.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let nodes = match Self::read_file(&path) {
            Ok(Some(cache)) => {
                debug!("loaded {} cached nodes from {}", cache.nodes.len(), path.display());
                cache.nodes
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(
                    "failed to load node cache {} ({}), starting fresh",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };
        Self {
            path,
            nodes: Mutex::new(nodes),
        }
    }

    fn read_file(path: &Path) -> Result<Option<CacheFile>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        // Guard against leading NULs from a previous partial write.
        let trimmed = content.trim_start_matches('\0');
        if trimmed.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    fn write_file(&self, nodes: &HashMap<NodeId, NodeEntity>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let cache = CacheFile {
            nodes: nodes.clone(),
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&cache)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl NodePersistence for JsonNodeCache {
    fn upsert(&self, entity: &NodeEntity) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let mut record = entity.clone();
        if let Some(existing) = nodes.get(&entity.num) {
            // First-seen timestamp survives every upsert.
            record.first_seen = existing.first_seen.min(record.first_seen);
        }
        nodes.insert(entity.num, record);
        self.write_file(&nodes)
    }

    fn load_all(&self) -> Result<Vec<NodeEntity>> {
        let nodes = self.nodes.lock().unwrap();
        let mut all: Vec<NodeEntity> = nodes.values().cloned().collect();
        all.sort_by(|a, b| b.last_heard.cmp(&a.last_heard));
        Ok(all)
    }

    fn clear(&self) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.clear();
        self.write_file(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_survives_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonNodeCache::open(dir.path().join("nodes.json"));

        let mut e = NodeEntity::new(42, Utc::now() - chrono::Duration::hours(1));
        let original_first_seen = e.first_seen;
        cache.upsert(&e).unwrap();

        e.first_seen = Utc::now(); // caller passes a later value
        e.long_name = "renamed".into();
        cache.upsert(&e).unwrap();

        let all = cache.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].first_seen, original_first_seen);
        assert_eq!(all[0].long_name, "renamed");
    }

    #[test]
    fn reload_orders_by_recency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        {
            let cache = JsonNodeCache::open(&path);
            let mut older = NodeEntity::new(1, Utc::now());
            older.last_heard = Utc::now() - chrono::Duration::minutes(10);
            let newer = NodeEntity::new(2, Utc::now());
            cache.upsert(&older).unwrap();
            cache.upsert(&newer).unwrap();
        }
        let reloaded = JsonNodeCache::open(&path);
        let all = reloaded.load_all().unwrap();
        assert_eq!(all.iter().map(|e| e.num).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn corrupt_cache_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        std::fs::write(&path, "\0\0not json").unwrap();
        let cache = JsonNodeCache::open(&path);
        assert!(cache.load_all().unwrap().is_empty());
    }
}
