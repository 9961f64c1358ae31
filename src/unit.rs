use crate::error::UnitError;
use crate::registry::CacheRegistry;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased value held by a cache unit. Units decide their own value types;
/// callers downcast with [`Arc::downcast`] or via [`CacheRegistry::get_as`].
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value for storage in a cache unit.
pub fn value<T: Send + Sync + 'static>(inner: T) -> CacheValue {
    Arc::new(inner)
}

/// A pluggable cache component owning one key→value mapping.
///
/// Keys are strings because the change-notification transport identifies
/// changed records by string key.
pub trait CacheUnit: Send + Sync + 'static {
    /// Full load of the unit's data, e.g. a whole table. Runs once at
    /// registry bootstrap; an error there is fatal and nothing is published.
    fn load(&self) -> Result<HashMap<String, CacheValue>, UnitError>;

    /// Re-fetch a single record. `Ok(None)` means the record is gone and the
    /// key must be deleted from the cache. Errors are logged by the registry
    /// and the key is skipped, never acknowledged.
    fn refresh(&self, key: &str) -> Result<Option<CacheValue>, UnitError>;
}

/// Change-notification hookup, armed once after the registry is fully loaded.
///
/// The listener gets the ready registry handle so it can call
/// [`CacheRegistry::refresh`] when it detects changed keys; it must re-deliver
/// any key absent from the returned acknowledgment list.
pub trait ChangeListener: Send + Sync {
    fn register(&self, registry: Arc<CacheRegistry>) -> Result<(), UnitError>;
}
