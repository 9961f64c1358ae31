use crate::error::{CacheError, CacheResult};

use serde::Deserialize;

use std::collections::HashSet;
use std::path::Path;

/// The resolved group→unit structure the registry is bootstrapped from.
///
/// Field names keep the original configuration vocabulary (`cacheGroup`,
/// `cache`, `cacheListener`), so a topology file looks like:
///
/// ```toml
/// [[cacheGroup]]
/// id = "service-info"
///
///   [[cacheGroup.cache]]
///   id = "ServiceInfoCache"
///
/// [[cacheListener]]
/// id = "ZkWatcher"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default, rename = "cacheGroup")]
    pub groups: Vec<CacheGroupSpec>,
    #[serde(default, rename = "cacheListener")]
    pub listeners: Vec<ListenerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheGroupSpec {
    pub id: String,
    #[serde(default, rename = "cache")]
    pub caches: Vec<CacheSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSpec {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenerSpec {
    pub id: String,
}

impl Topology {
    pub fn from_toml(raw: &str) -> CacheResult<Self> {
        let topology: Topology =
            toml::from_str(raw).map_err(|e| CacheError::topology(e.to_string()))?;

        topology.validate()?;
        Ok(topology)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CacheError::TopologyIo {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&raw)
    }

    /// Boundary validation: the registry never sees blank or duplicate ids.
    ///
    /// Cache ids must be unique across the whole file, not just within their
    /// group, because each id maps to one concrete unit type and a unit
    /// belongs to exactly one group.
    fn validate(&self) -> CacheResult<()> {
        let mut group_ids = HashSet::new();
        let mut cache_ids = HashSet::new();

        for group in &self.groups {
            if group.id.trim().is_empty() {
                return Err(CacheError::topology("cacheGroup with a blank id"));
            }
            if !group_ids.insert(group.id.trim()) {
                return Err(CacheError::topology(format!(
                    "duplicate cacheGroup id `{}`",
                    group.id
                )));
            }

            for cache in &group.caches {
                if cache.id.trim().is_empty() {
                    return Err(CacheError::topology(format!(
                        "cache with a blank id in group `{}`",
                        group.id
                    )));
                }
                if !cache_ids.insert(cache.id.trim()) {
                    return Err(CacheError::topology(format!(
                        "duplicate cache id `{}`",
                        cache.id
                    )));
                }
            }
        }

        for listener in &self.listeners {
            if listener.id.trim().is_empty() {
                return Err(CacheError::topology("cacheListener with a blank id"));
            }
        }

        Ok(())
    }
}
