use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::sim::timing::{check_wait, exponential_upper_bound_secs, DwellTime};
use crate::tunnel::TravelerClass;

// Valores de los dos escenarios clásicos ----
const TIME_CARS: f64 = 0.5; // llega un coche cada 0.5s en promedio
const TIME_PED: f64 = 5.0; // llega un peatón cada 5s en promedio

/// Escenarios predefinidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 5 coches al norte, 5 al sur, 5 peatones; tiempos uniformes.
    #[default]
    Small,
    /// 100 coches por sentido, 10 peatones; tiempos normales.
    Rush,
}

/// Parámetros de una clase de viajero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassConfig {
    pub count: u64,
    pub mean_interarrival_secs: f64,
    pub dwell: DwellTime,
}

/// Configuración completa de una corrida.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub north: ClassConfig,
    pub south: ClassConfig,
    pub pedestrian: ClassConfig,
    /// Factor que multiplica todas las esperas (1.0 = tiempo real).
    pub time_scale: f64,
    /// Espera entre que se crea el viajero y pide entrar, antes de escalar.
    pub approach: Duration,
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn preset(preset: Preset) -> Self {
        let (cars, peds, car_dwell, ped_dwell) = match preset {
            Preset::Small => (
                5,
                5,
                DwellTime::Uniform { min_secs: 0.5, max_secs: 2.0 },
                DwellTime::Uniform { min_secs: 10.0, max_secs: 30.0 },
            ),
            Preset::Rush => (
                100,
                10,
                DwellTime::Normal { mean_secs: 1.0, std_dev_secs: 0.5 },
                DwellTime::Normal { mean_secs: 30.0, std_dev_secs: 10.0 },
            ),
        };
        let car = ClassConfig {
            count: cars,
            mean_interarrival_secs: TIME_CARS,
            dwell: car_dwell,
        };
        Self {
            north: car,
            south: car,
            pedestrian: ClassConfig {
                count: peds,
                mean_interarrival_secs: TIME_PED,
                dwell: ped_dwell,
            },
            time_scale: 1.0,
            approach: Duration::ZERO,
            seed: None,
        }
    }

    pub fn class(&self, class: TravelerClass) -> &ClassConfig {
        match class {
            TravelerClass::North => &self.north,
            TravelerClass::South => &self.south,
            TravelerClass::Pedestrian => &self.pedestrian,
        }
    }

    pub fn class_mut(&mut self, class: TravelerClass) -> &mut ClassConfig {
        match class {
            TravelerClass::North => &mut self.north,
            TravelerClass::South => &mut self.south,
            TravelerClass::Pedestrian => &mut self.pedestrian,
        }
    }

    /// Pisa los valores presentes en el archivo. Lo que falta se queda igual.
    pub fn apply_file(&mut self, file: &FileConfig) {
        if let Some(scale) = file.time_scale {
            self.time_scale = scale;
        }
        if let Some(ms) = file.approach_ms {
            self.approach = Duration::from_millis(ms);
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        for class in TravelerClass::ALL {
            let Some(section) = file.section(class) else {
                continue;
            };
            let target = self.class_mut(class);
            if let Some(count) = section.count {
                target.count = count;
            }
            if let Some(mean) = section.mean_interarrival_secs {
                target.mean_interarrival_secs = mean;
            }
            if let Some(dwell) = section.dwell {
                target.dwell = dwell;
            }
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "time scale must be > 0, got {}",
                self.time_scale
            )));
        }
        for class in TravelerClass::ALL {
            let cfg = self.class(class);
            let mean = cfg.mean_interarrival_secs;
            if !(mean.is_finite() && mean >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{class}: mean interarrival must be >= 0, got {mean}"
                )));
            }
            cfg.dwell
                .validate()
                .map_err(|msg| SimError::InvalidConfig(format!("{class}: {msg}")))?;

            // toda espera muestreada tiene que caber en un Duration una vez escalada
            check_wait(
                &format!("{class} dwell"),
                cfg.dwell.upper_bound_secs(),
                self.time_scale,
            )?;
            check_wait(
                &format!("{class} interarrival"),
                exponential_upper_bound_secs(mean),
                self.time_scale,
            )?;
        }
        check_wait("approach", self.approach.as_secs_f64(), self.time_scale)?;
        Ok(())
    }

    /// Población total configurada por clase.
    pub fn population(&self) -> crate::tunnel::ClassCounts {
        crate::tunnel::ClassCounts::new(self.north.count, self.south.count, self.pedestrian.count)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

/// Sección de una clase en el archivo TOML. Todo es opcional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSection {
    pub count: Option<u64>,
    pub mean_interarrival_secs: Option<f64>,
    pub dwell: Option<DwellTime>,
}

/// Contenido del archivo `--config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub preset: Option<Preset>,
    pub time_scale: Option<f64>,
    pub approach_ms: Option<u64>,
    pub seed: Option<u64>,
    pub north: Option<ClassSection>,
    pub south: Option<ClassSection>,
    pub pedestrian: Option<ClassSection>,
}

impl FileConfig {
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn section(&self, class: TravelerClass) -> Option<&ClassSection> {
        match class {
            TravelerClass::North => self.north.as_ref(),
            TravelerClass::South => self.south.as_ref(),
            TravelerClass::Pedestrian => self.pedestrian.as_ref(),
        }
    }
}
