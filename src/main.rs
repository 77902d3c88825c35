use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tunnelcity::sim::{self, FileConfig, Preset, SimConfig};
use tunnelcity::tunnel::TravelerClass;

/// Tunel de un carril: coches al norte, coches al sur y peatones, un hilo por viajero.
#[derive(Parser, Debug)]
#[command(name = "tunnelcity")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Escenario base
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Archivo TOML con ajustes (se aplica sobre el preset)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Coches hacia el norte
    #[arg(long)]
    north: Option<u64>,

    /// Coches hacia el sur
    #[arg(long)]
    south: Option<u64>,

    /// Peatones
    #[arg(long)]
    pedestrians: Option<u64>,

    /// Factor para todas las esperas (0.1 = diez veces más rápido)
    #[arg(long)]
    time_scale: Option<f64>,

    /// Espera entre crearse y pedir entrar, en ms
    #[arg(long)]
    approach_ms: Option<u64>,

    /// Semilla para tiempos reproducibles
    #[arg(long)]
    seed: Option<u64>,

    /// Mostrar eventos de depuración
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// preset < archivo < flags
    fn resolve(&self) -> Result<SimConfig> {
        let file = match &self.config {
            Some(path) => Some(FileConfig::load(path)?),
            None => None,
        };

        let preset = self
            .preset
            .or_else(|| file.as_ref().and_then(|f| f.preset))
            .unwrap_or_default();
        let mut config = SimConfig::preset(preset);
        if let Some(file) = &file {
            config.apply_file(file);
        }

        let counts = [
            (TravelerClass::North, self.north),
            (TravelerClass::South, self.south),
            (TravelerClass::Pedestrian, self.pedestrians),
        ];
        for (class, count) in counts {
            if let Some(count) = count {
                config.class_mut(class).count = count;
            }
        }
        if let Some(scale) = self.time_scale {
            config.time_scale = scale;
        }
        if let Some(ms) = self.approach_ms {
            config.approach = Duration::from_millis(ms);
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.resolve()?;
    sim::timing::start_clock();

    println!("=== Tunel: población inicial ===");
    println!("{}", config.population());
    println!("================================\n");

    let report = sim::run(&config)?;

    println!("\n🏁 Todos los viajeros cruzaron.");
    for (class, count) in report.final_state.completed.iter() {
        println!("  {class}: {count}");
    }
    Ok(())
}
