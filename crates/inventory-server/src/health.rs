//! Liveness (`GET /health`) and readiness (`GET /ready`) probes.
//!
//! ```rust
//! use inventory_server::{HealthCheck, ReadinessCheck};
//!
//! let health = HealthCheck::new("inventory", "1.0.0");
//! assert_eq!(health.status().status, "healthy");
//!
//! let readiness = ReadinessCheck::new();
//! readiness.set_ready(false);
//! assert!(!readiness.status().is_ready());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body of a `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Always `"healthy"` while the process answers.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Whole seconds since the server was built.
    pub uptime_seconds: u64,
}

impl HealthStatus {
    /// A healthy report for `service` after `uptime`.
    #[must_use]
    pub fn healthy(service: &str, version: &str, uptime: Duration) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            uptime_seconds: uptime.as_secs(),
        }
    }
}

/// Liveness probe state.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started: Instant,
}

impl HealthCheck {
    /// Uptime counts from this call.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    /// Snapshot for the `/health` body.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus::healthy(&self.service, &self.version, self.started.elapsed())
    }

    /// Service name reported by the probe.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Service version reported by the probe.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Body of a `/ready` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    ready: bool,
}

impl ReadinessStatus {
    /// `true` while the server accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Readiness flag, shared by clones.
///
/// Starts ready; the server clears it once shutdown begins.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    ready: Arc<AtomicBool>,
}

impl ReadinessCheck {
    /// A check in the ready state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flips the flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Current value of the flag.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Snapshot for the `/ready` body.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: self.is_ready(),
        }
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}
