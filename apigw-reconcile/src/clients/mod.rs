//! Remote accessors.
//!
//! - `memory`: in-memory collections with a call journal (tests, dry runs)
//! - `http`: JSON-over-HTTP collections of a live control plane (feature `http`)

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

use std::sync::Arc;
#[cfg(feature = "http")]
use std::time::Duration;

use tracing::info;

#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpCollection};
pub use memory::{Call, MemoryCollection, MemoryGateway, MemoryRecord};

use crate::config::{BackendConfig, BackendKind};
use crate::error::{ReconcileError, Result};

/// A ready-to-use backend, resolved once at startup.
pub enum Backend {
    Memory(Arc<MemoryGateway>),
    #[cfg(feature = "http")]
    Http(HttpBackend),
}

impl Backend {
    /// Resolves the configured backend, failing fast when this build or the
    /// configuration cannot provide it.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        match config.kind {
            BackendKind::Memory => {
                info!("Using in-memory backend");
                Ok(Backend::Memory(Arc::new(MemoryGateway::new())))
            }
            BackendKind::Http => Self::http(config),
        }
    }

    #[cfg(feature = "http")]
    fn http(config: &BackendConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                ReconcileError::CapabilityMissing(
                    "http backend selected but no endpoint configured".to_string(),
                )
            })?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ReconcileError::config(
                "endpoint",
                format!("'{}' is not an http(s) url", endpoint),
            ));
        }

        let backend = HttpBackend::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
            config.page_size,
        )
        .map_err(|e| ReconcileError::CapabilityMissing(format!("http client unavailable: {}", e)))?;
        info!("Using http backend at {}", backend.endpoint());
        Ok(Backend::Http(backend))
    }

    #[cfg(not(feature = "http"))]
    fn http(_config: &BackendConfig) -> Result<Self> {
        Err(ReconcileError::CapabilityMissing(
            "http backend requested but this build was compiled without the 'http' feature"
                .to_string(),
        ))
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Memory(_) => BackendKind::Memory,
            #[cfg(feature = "http")]
            Backend::Http(_) => BackendKind::Http,
        }
    }
}
