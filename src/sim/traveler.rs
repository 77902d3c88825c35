use std::thread;
use std::time::Duration;

use tracing::info;

use crate::sim::timing::elapsed_ms;
use crate::tunnel::{BridgeMonitor, TravelerClass};

/// Un cruce: pide entrar, se queda `dwell` dentro y sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traveler {
    pub id: usize,
    pub class: TravelerClass,
    /// Tiempo que pasa entre crearse y pedir entrar.
    pub approach: Duration,
    /// Tiempo dentro del tunel.
    pub dwell: Duration,
}

impl Traveler {
    /// Hace el cruce completo. Bloquea en `request_entry` si hace falta.
    pub fn cross(&self, monitor: &BridgeMonitor) {
        let (id, class) = (self.id, self.class);
        info!(id, %class, elapsed_ms = elapsed_ms(), "created");

        if !self.approach.is_zero() {
            thread::sleep(self.approach);
        }

        info!(id, %class, elapsed_ms = elapsed_ms(), "wants to enter");
        monitor.request_entry(class);
        let inside = monitor.snapshot().occupancy;
        info!(id, %class, elapsed_ms = elapsed_ms(), %inside, "enters the bridge");

        thread::sleep(self.dwell);

        info!(id, %class, elapsed_ms = elapsed_ms(), "leaving the bridge");
        monitor.release_exit(class);
        let completed = monitor.snapshot().completed;
        info!(id, %class, elapsed_ms = elapsed_ms(), %completed, "out of the bridge");
    }
}
