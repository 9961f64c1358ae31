use crate::error::{CacheError, CacheResult};
use crate::unit::{CacheUnit, ChangeListener};

use hashbrown::HashMap;

use std::any::TypeId;
use std::sync::Arc;

type UnitCtor = Box<dyn Fn() -> Box<dyn CacheUnit> + Send + Sync>;
type ListenerCtor = Box<dyn Fn() -> Arc<dyn ChangeListener> + Send + Sync>;

struct UnitEntry {
    type_id: TypeId,
    build: UnitCtor,
}

/// Explicit registry mapping the unit and listener ids declared in a
/// [`crate::Topology`] to constructors.
///
/// The concrete type behind each id is captured at registration, so the
/// registry never resolves a type from a name at runtime; an id nobody
/// registered fails bootstrap.
pub struct UnitFactory {
    units: HashMap<String, UnitEntry>,
    listeners: HashMap<String, ListenerCtor>,
}

impl UnitFactory {
    pub fn new() -> Self {
        UnitFactory {
            units: HashMap::new(),
            listeners: HashMap::new(),
        }
    }

    /// Register a cache unit under the id the topology declares it with.
    pub fn unit<U, F>(mut self, id: &str, ctor: F) -> Self
    where
        U: CacheUnit,
        F: Fn() -> U + Send + Sync + 'static,
    {
        self.units.insert(
            id.to_string(),
            UnitEntry {
                type_id: TypeId::of::<U>(),
                build: Box::new(move || Box::new(ctor())),
            },
        );
        self
    }

    /// Register a change listener under the id the topology declares it with.
    pub fn listener<L, F>(mut self, id: &str, ctor: F) -> Self
    where
        L: ChangeListener + 'static,
        F: Fn() -> L + Send + Sync + 'static,
    {
        self.listeners
            .insert(id.to_string(), Box::new(move || Arc::new(ctor())));
        self
    }

    pub fn build_unit(&self, id: &str) -> CacheResult<(TypeId, Box<dyn CacheUnit>)> {
        let entry = self
            .units
            .get(id)
            .ok_or_else(|| CacheError::UnknownUnit(id.to_string()))?;

        Ok((entry.type_id, (entry.build)()))
    }

    pub fn build_listener(&self, id: &str) -> CacheResult<Arc<dyn ChangeListener>> {
        let ctor = self
            .listeners
            .get(id)
            .ok_or_else(|| CacheError::UnknownListener(id.to_string()))?;

        Ok(ctor())
    }
}

impl Default for UnitFactory {
    fn default() -> Self {
        Self::new()
    }
}
