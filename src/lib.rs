//! Grouped in-process caching for slowly-changing reference data.
//!
//! # Quick Start
//! Describe your groups in a [`Topology`], register the unit constructors on a
//! [`UnitFactory`], then [`CacheRegistry::bootstrap`] loads everything and
//! hands back the shared registry. Arm the change listeners afterwards and let
//! them drive [`CacheRegistry::refresh`].

pub mod registry;
#[doc(inline)]
pub use registry::CacheRegistry;

/// A standalone lazy single-flight map; the registry does not depend on it but
/// it shares the same per-key locking discipline.
pub mod map;
#[doc(inline)]
pub use map::{LazyMap, Loader};

/// The contracts pluggable components implement.
pub mod unit;
#[doc(inline)]
pub use unit::{value, CacheUnit, CacheValue, ChangeListener};

pub mod factory;
#[doc(inline)]
pub use factory::UnitFactory;

pub mod topology;
#[doc(inline)]
pub use topology::Topology;

pub mod lock;
#[doc(inline)]
pub use lock::LockTable;

pub mod error;
#[doc(inline)]
pub use error::{CacheError, CacheResult, UnitError};
