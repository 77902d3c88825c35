use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use rand::Rng;
use serde::Deserialize;

use crate::error::{SimError, SimResult};

/// Espera real más larga que aceptamos para una sola muestra, en segundos.
/// Queda por debajo de lo que cabe en un `Duration`.
pub const MAX_WAIT_SECS: f64 = u64::MAX as f64 / 2.0;

// Box-Muller con u1 >= 2^-53 nunca pasa de ~8.6 desviaciones
const NORMAL_TAIL_SDS: f64 = 9.0;
// -ln(2^-53) ~ 36.7 veces la media
const EXP_TAIL_MEANS: f64 = 37.0;

// Reloj de la simulación ----
static START: Lazy<Instant> = Lazy::new(Instant::now);

/// Milisegundos desde el primer uso del reloj.
pub fn elapsed_ms() -> u64 {
    START.elapsed().as_millis() as u64
}

/// Arranca el reloj. Llamarlo al inicio hace que `elapsed_ms` cuente desde ahí.
pub fn start_clock() {
    Lazy::force(&START);
}

/// Distribución del tiempo que un viajero pasa dentro del tunel, en segundos.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DwellTime {
    Uniform { min_secs: f64, max_secs: f64 },
    /// Normal recortada en cero.
    Normal { mean_secs: f64, std_dev_secs: f64 },
}

impl DwellTime {
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            DwellTime::Uniform { min_secs, max_secs } => {
                if !(min_secs.is_finite() && max_secs.is_finite()) || min_secs < 0.0 {
                    return Err(format!("uniform dwell [{min_secs}, {max_secs}] must be finite and >= 0"));
                }
                if min_secs > max_secs {
                    return Err(format!("uniform dwell min {min_secs} > max {max_secs}"));
                }
            }
            DwellTime::Normal { mean_secs, std_dev_secs } => {
                if !(mean_secs.is_finite() && std_dev_secs.is_finite()) || std_dev_secs < 0.0 {
                    return Err(format!(
                        "normal dwell (mean {mean_secs}, sd {std_dev_secs}) must be finite with sd >= 0"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cota superior de cualquier muestra, en segundos.
    pub fn upper_bound_secs(&self) -> f64 {
        match *self {
            DwellTime::Uniform { max_secs, .. } => max_secs,
            DwellTime::Normal { mean_secs, std_dev_secs } => {
                (mean_secs + NORMAL_TAIL_SDS * std_dev_secs).max(0.0)
            }
        }
    }

    /// Saca una muestra en segundos, nunca negativa.
    pub fn sample_secs<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            DwellTime::Uniform { min_secs, max_secs } => {
                if min_secs == max_secs {
                    min_secs
                } else {
                    rng.gen_range(min_secs..=max_secs)
                }
            }
            DwellTime::Normal { mean_secs, std_dev_secs } => {
                (mean_secs + std_dev_secs * standard_normal(rng)).max(0.0)
            }
        }
    }
}

/// Box-Muller sobre dos uniformes.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // 1 - u está en (0, 1], así ln nunca ve un cero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Intervalo exponencial con media `mean_secs` (transformada inversa).
pub fn exponential_secs<R: Rng>(rng: &mut R, mean_secs: f64) -> f64 {
    let u: f64 = rng.gen::<f64>();
    -mean_secs * (1.0 - u).ln()
}

/// Cota superior de `exponential_secs` para una media dada.
pub fn exponential_upper_bound_secs(mean_secs: f64) -> f64 {
    EXP_TAIL_MEANS * mean_secs
}

/// Revisa que `secs` escalado quepa en una espera real.
pub fn check_wait(what: &str, secs: f64, time_scale: f64) -> SimResult<()> {
    let real = secs * time_scale;
    if real.is_finite() && real <= MAX_WAIT_SECS {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{what}: {secs}s x time scale {time_scale} does not fit in a wait"
        )))
    }
}

/// Convierte segundos de simulación en una espera real, aplicando la escala.
pub fn scaled(secs: f64, time_scale: f64) -> SimResult<Duration> {
    Duration::try_from_secs_f64((secs * time_scale).max(0.0)).map_err(|e| {
        SimError::InvalidConfig(format!("wait of {secs}s x time scale {time_scale}: {e}"))
    })
}
