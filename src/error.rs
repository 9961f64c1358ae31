use thiserror::Error;

/// Boundary error produced by pluggable [`crate::CacheUnit`] and
/// [`crate::ChangeListener`] implementations.
pub type UnitError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache topology: {0}")]
    Topology(String),
    #[error("cannot read cache topology from `{path}`")]
    TopologyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no cache unit registered under id `{0}`")]
    UnknownUnit(String),
    #[error("no cache listener registered under id `{0}`")]
    UnknownListener(String),
    #[error("cache unit `{unit}` failed to load")]
    UnitLoad {
        unit: String,
        #[source]
        source: UnitError,
    },
    #[error("cache `{0}` is not configured")]
    NotConfigured(&'static str),
    #[error("cache listener `{listener}` failed to register")]
    ListenerRegistration {
        listener: String,
        #[source]
        source: UnitError,
    },
}

impl CacheError {
    pub fn topology<S: Into<String>>(msg: S) -> Self {
        Self::Topology(msg.into())
    }

    /// Startup errors abort bootstrap entirely; only `NotConfigured` can be
    /// seen by a process that is already serving.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotConfigured(_))
    }
}
