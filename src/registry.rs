use crate::error::{CacheError, CacheResult};
use crate::factory::UnitFactory;
use crate::lock::LockTable;
use crate::topology::Topology;
use crate::unit::{CacheUnit, CacheValue};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use hashbrown::HashMap as UnitIndex;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const LOCK_SEPARATOR: &str = "@@";

fn lock_key(group: &str, key: &str) -> String {
    format!("{group}{LOCK_SEPARATOR}{key}")
}

struct GroupMember {
    type_id: TypeId,
    unit: Box<dyn CacheUnit>,
}

/// Composes [`CacheUnit`]s into named groups and serves their data to the
/// whole process.
///
/// Startup is two sequential phases. [`CacheRegistry::bootstrap`] resolves
/// every declared unit, fully loads it and only then hands back the shared
/// registry; any failure aborts and nothing is published. Once the handle
/// exists, [`CacheRegistry::arm_listeners`] registers the change-notification
/// listeners exactly once, so a listener can never call [`CacheRegistry::refresh`]
/// against a half-built registry.
///
/// Reads and refreshes of the same `(group, key)` serialize on a dedicated
/// read/write lock; everything else runs in parallel. The lock is shared by
/// all units of a group on purpose, to keep the lock table bounded by the key
/// space rather than by units × keys.
pub struct CacheRegistry {
    /// Each unit's content map, keyed by the unit's concrete type.
    /// The outer map is frozen after bootstrap; only the inner maps mutate.
    contents: UnitIndex<TypeId, RwLock<HashMap<String, CacheValue>>>,
    /// Group id → ordered member units, as declared in the topology.
    members: UnitIndex<String, Vec<GroupMember>>,
    /// Reverse index for O(1) group lookup on the read path.
    group_of: UnitIndex<TypeId, String>,
    /// `group@@key` striped locks, created lazily, never pruned.
    lockers: LockTable<String, RwLock<()>>,
    listener_ids: Vec<String>,
    listener_armed: AtomicBool,
}

impl CacheRegistry {
    /// Phase 1: instantiate and fully load every declared unit.
    ///
    /// Fails fast on an id the factory does not know, on a unit type that is
    /// declared twice, and on any `load()` error. Reference data must be
    /// complete before the process starts serving, so there is no partial
    /// bootstrap.
    pub fn bootstrap(topology: &Topology, factory: &UnitFactory) -> CacheResult<Arc<Self>> {
        let mut contents = UnitIndex::new();
        let mut members = UnitIndex::new();
        let mut group_of = UnitIndex::new();

        for group in &topology.groups {
            let mut units = Vec::with_capacity(group.caches.len());

            for cache in &group.caches {
                let id = cache.id.trim();
                let (type_id, unit) = factory.build_unit(id)?;

                if group_of.contains_key(&type_id) {
                    return Err(CacheError::topology(format!(
                        "cache `{id}` resolves to a unit type that is already in use"
                    )));
                }
                group_of.insert(type_id, group.id.clone());

                let loaded = unit.load().map_err(|source| CacheError::UnitLoad {
                    unit: id.to_string(),
                    source,
                })?;

                info!(
                    group = group.id.as_str(),
                    unit = id,
                    entries = loaded.len(),
                    "cache unit loaded"
                );

                contents.insert(type_id, RwLock::new(loaded));
                units.push(GroupMember { type_id, unit });
            }

            members.insert(group.id.clone(), units);
        }

        Ok(Arc::new(CacheRegistry {
            contents,
            members,
            group_of,
            lockers: LockTable::new(),
            listener_ids: topology.listeners.iter().map(|l| l.id.clone()).collect(),
            listener_armed: AtomicBool::new(false),
        }))
    }

    /// Phase 2: build and register the declared change listeners.
    ///
    /// One-shot per process: the first call arms and returns `Ok(true)`,
    /// every later call is a no-op returning `Ok(false)`. Must only be called
    /// on the handle returned by [`CacheRegistry::bootstrap`], which is what
    /// makes it safe for a listener to refresh immediately.
    pub fn arm_listeners(self: &Arc<Self>, factory: &UnitFactory) -> CacheResult<bool> {
        if self
            .listener_armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(false);
        }

        for id in &self.listener_ids {
            let listener = factory.build_listener(id)?;
            listener
                .register(Arc::clone(self))
                .map_err(|source| CacheError::ListenerRegistration {
                    listener: id.clone(),
                    source,
                })?;

            info!(listener = id.as_str(), "change listener armed");
        }

        Ok(true)
    }

    /// Read a value from unit `U`'s map under the `(group, key)` read lock.
    ///
    /// `Ok(None)` means the key was never loaded or has been deleted by a
    /// refresh. A `U` that is not part of the bootstrapped topology is a
    /// [`CacheError::NotConfigured`] instead, never a silent `None`.
    pub fn get<U: CacheUnit>(&self, key: &str) -> CacheResult<Option<CacheValue>> {
        let not_configured = || CacheError::NotConfigured(std::any::type_name::<U>());

        let type_id = TypeId::of::<U>();
        let content = self.contents.get(&type_id).ok_or_else(not_configured)?;
        let group = self.group_of.get(&type_id).ok_or_else(not_configured)?;

        let stripe = self.lockers.of(&lock_key(group, key));
        let _read = stripe.read();

        Ok(content.read().get(key).cloned())
    }

    /// [`CacheRegistry::get`] plus a downcast to the value type unit `U` stores.
    /// A value of a different concrete type comes back as `None`.
    pub fn get_as<U, T>(&self, key: &str) -> CacheResult<Option<Arc<T>>>
    where
        U: CacheUnit,
        T: Send + Sync + 'static,
    {
        Ok(self.get::<U>(key)?.and_then(|v| v.downcast::<T>().ok()))
    }

    /// Apply a batch of changed keys to every unit of `group_id`.
    ///
    /// The returned list is the acknowledgment the notification transport
    /// consumes: a key appears exactly once, and only if every unit in the
    /// group applied it. The caller must re-deliver any key it asked for that
    /// is missing from the list.
    ///
    /// A unit `refresh` error is logged and skipped; the rest of the batch
    /// keeps going, because the typical caller is a long-running notification
    /// consumer and one bad record must not stall every other update. An
    /// unknown group acknowledges nothing and raises no error.
    pub fn refresh(&self, group_id: &str, keys: &[String]) -> Vec<String> {
        let mut applied = Vec::new();

        if keys.is_empty() {
            debug!(group = group_id, "refresh called with no keys");
            return applied;
        }

        let Some(members) = self.members.get(group_id) else {
            debug!(group = group_id, "refresh for unknown group, nothing applied");
            return applied;
        };
        if members.is_empty() {
            return applied;
        }

        for key in keys {
            let mut applied_everywhere = true;

            for member in members {
                debug!(group = group_id, key = key.as_str(), "refreshing cache entry");

                let refreshed = match member.unit.refresh(key) {
                    Ok(refreshed) => refreshed,
                    Err(error) => {
                        error!(
                            group = group_id,
                            key = key.as_str(),
                            %error,
                            "refresh failed, key skipped"
                        );
                        applied_everywhere = false;
                        continue;
                    }
                };

                // present for every member since bootstrap
                let Some(content) = self.contents.get(&member.type_id) else {
                    applied_everywhere = false;
                    continue;
                };

                let stripe = self.lockers.of(&lock_key(group_id, key));
                let _write = stripe.write();

                match refreshed {
                    Some(value) => {
                        content.write().insert(key.clone(), value);
                    }
                    // the record is gone; delete, never store a placeholder
                    None => {
                        content.write().remove(key.as_str());
                    }
                }
            }

            if applied_everywhere {
                applied.push(key.clone());
            }
        }

        debug!(group = group_id, applied = ?applied, "refresh acknowledged");
        applied
    }

    /// Ids of the groups this registry was bootstrapped with.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|id| id.as_str())
    }
}
