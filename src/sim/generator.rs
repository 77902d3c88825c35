use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::sim::config::ClassConfig;
use crate::sim::timing::{exponential_secs, scaled};
use crate::sim::traveler::Traveler;
use crate::tunnel::{BridgeMonitor, TravelerClass};

/// Lo que devuelve un generador al terminar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorReport {
    pub class: TravelerClass,
    pub spawned: u64,
}

/// Genera los viajeros de una clase a intervalos exponenciales,
/// un hilo por viajero, y los espera a todos.
#[derive(Debug)]
pub struct ArrivalGenerator {
    pub class: TravelerClass,
    pub config: ClassConfig,
    pub time_scale: f64,
    pub approach: Duration,
    /// Contador de ids compartido con los demás generadores.
    pub next_id: Arc<AtomicUsize>,
    rng: StdRng,
}

impl ArrivalGenerator {
    pub fn new(
        class: TravelerClass,
        config: ClassConfig,
        time_scale: f64,
        next_id: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            class,
            config,
            time_scale,
            approach: Duration::ZERO,
            next_id,
            rng: StdRng::from_entropy(),
        }
    }

    /// Semilla fija para corridas reproducibles.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_approach(mut self, approach: Duration) -> Self {
        self.approach = approach;
        self
    }

    /// Emite la población entera y espera a todos los viajeros.
    ///
    /// Si no se puede crear un hilo o una espera no cabe en un `Duration`,
    /// deja de emitir, espera a los que ya salieron y devuelve ese error.
    pub fn run(mut self, monitor: Arc<BridgeMonitor>) -> SimResult<GeneratorReport> {
        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::new();
        let mut failed = None;

        for _ in 0..self.config.count {
            match self.spawn_traveler(&monitor) {
                Ok(entry) => handles.push(entry),
                Err(e) => {
                    failed = Some(e);
                    break;
                }
            }

            let gap = exponential_secs(&mut self.rng, self.config.mean_interarrival_secs);
            match scaled(gap, self.time_scale) {
                Ok(wait) => thread::sleep(wait),
                Err(e) => {
                    failed = Some(e);
                    break;
                }
            }
        }

        debug!(class = %self.class, spawned = handles.len(), "travelers issued, joining");

        let spawned = handles.len() as u64;
        let mut panicked = None;
        for (name, handle) in handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(name);
            }
        }
        if let Some(e) = failed {
            return Err(e);
        }
        if let Some(name) = panicked {
            return Err(SimError::WorkerPanicked { name });
        }

        Ok(GeneratorReport {
            class: self.class,
            spawned,
        })
    }

    fn spawn_traveler(&mut self, monitor: &Arc<BridgeMonitor>) -> SimResult<(String, JoinHandle<()>)> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let traveler = Traveler {
            id,
            class: self.class,
            approach: scaled(self.approach.as_secs_f64(), self.time_scale)?,
            dwell: scaled(self.config.dwell.sample_secs(&mut self.rng), self.time_scale)?,
        };

        let name = format!("{}-{}", self.class.short(), id);
        let monitor = Arc::clone(monitor);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || traveler.cross(&monitor))
            .map_err(|source| SimError::Spawn {
                name: name.clone(),
                source,
            })?;
        Ok((name, handle))
    }
}
