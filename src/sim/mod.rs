//! Andamiaje de la simulación: generadores de llegadas, viajeros y el arnés
//! que los arranca. Todo comparte un único `BridgeMonitor` por `Arc`.

pub mod config;
pub mod generator;
pub mod harness;
pub mod timing;
pub mod traveler;

pub use config::{ClassConfig, FileConfig, Preset, SimConfig};
pub use generator::{ArrivalGenerator, GeneratorReport};
pub use harness::{run, run_with_monitor, SimReport};
pub use timing::DwellTime;
pub use traveler::Traveler;
