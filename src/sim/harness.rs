use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread;

use tracing::info;

use crate::error::{SimError, SimResult};
use crate::sim::config::SimConfig;
use crate::sim::generator::{ArrivalGenerator, GeneratorReport};
use crate::tunnel::{BridgeMonitor, BridgeSnapshot, TravelerClass};

/// Resultado final de una corrida.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub generators: Vec<GeneratorReport>,
    pub final_state: BridgeSnapshot,
}

/// Arranca los tres generadores sobre un monitor nuevo y espera a que terminen.
pub fn run(config: &SimConfig) -> SimResult<SimReport> {
    run_with_monitor(config, Arc::new(BridgeMonitor::new()))
}

/// Igual que `run`, pero sobre un monitor dado (por ejemplo uno con observador).
pub fn run_with_monitor(config: &SimConfig, monitor: Arc<BridgeMonitor>) -> SimResult<SimReport> {
    config.validate()?;
    let next_id = Arc::new(AtomicUsize::new(0));

    info!(population = %config.population(), time_scale = config.time_scale, "starting generators");

    let mut handles = Vec::with_capacity(TravelerClass::ALL.len());
    let mut first_err = None;
    for class in TravelerClass::ALL {
        let mut generator = ArrivalGenerator::new(
            class,
            *config.class(class),
            config.time_scale,
            Arc::clone(&next_id),
        )
        .with_approach(config.approach);
        if let Some(seed) = config.seed {
            generator = generator.with_seed(seed.wrapping_add(class.index() as u64));
        }

        let name = format!("gen-{}", class.short());
        let monitor = Arc::clone(&monitor);
        match thread::Builder::new()
            .name(name.clone())
            .spawn(move || generator.run(monitor))
        {
            Ok(handle) => handles.push((name, handle)),
            Err(source) => {
                // no se arrancan más generadores, pero los ya lanzados se esperan
                first_err = Some(SimError::Spawn { name, source });
                break;
            }
        }
    }

    let mut generators = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        match handle.join() {
            Ok(Ok(report)) => generators.push(report),
            Ok(Err(e)) => {
                first_err.get_or_insert(e);
            }
            Err(_) => {
                first_err.get_or_insert(SimError::WorkerPanicked { name });
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let final_state = monitor.snapshot();
    let expected = config.population();
    for class in TravelerClass::ALL {
        if final_state.completed[class] != expected[class] {
            return Err(SimError::Incomplete {
                class,
                expected: expected[class],
                completed: final_state.completed[class],
            });
        }
    }

    info!(completed = %final_state.completed, "simulation finished");
    Ok(SimReport {
        generators,
        final_state,
    })
}
