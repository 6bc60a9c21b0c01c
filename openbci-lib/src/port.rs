use crate::error::BciError;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Process-wide record of which serial ports are owned by a board session.
///
/// Clones share the same set. Pass one registry to every session that may open a
/// port so that two sessions never bind the same device.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    claimed: Arc<Mutex<BTreeSet<String>>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically check and claim `port`. The claim is released when the returned guard drops.
    pub fn claim(&self, port: &str) -> Result<PortClaim, BciError> {
        if !self.lock().insert(port.to_string()) {
            debug!(port, "Port already claimed");
            return Err(BciError::PortInUse(port.to_string()));
        }
        info!(port, "Claimed port");
        Ok(PortClaim {
            registry: self.clone(),
            port: port.to_string(),
        })
    }

    pub fn is_claimed(&self, port: &str) -> bool {
        self.lock().contains(port)
    }

    pub fn claimed_ports(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    fn release(&self, port: &str) {
        if self.lock().remove(port) {
            info!(port, "Released port");
        }
    }
}

/// Ownership of one port in a [`PortRegistry`].
#[derive(Debug)]
pub struct PortClaim {
    registry: PortRegistry,
    port: String,
}

impl PortClaim {
    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        self.registry.release(&self.port);
    }
}
