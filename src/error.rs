//! Errores de la simulación. El monitor en sí no devuelve errores.

use std::path::PathBuf;

use crate::tunnel::TravelerClass;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Algún parámetro no tiene sentido (duración negativa, rango invertido...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// El sistema operativo no dejó crear el hilo.
    #[error("could not spawn thread {name}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("thread {name} panicked")]
    WorkerPanicked { name: String },

    #[error("could not read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Al terminar, los contadores no cuadran con la población configurada.
    #[error("{class}: expected {expected} crossings, monitor counted {completed}")]
    Incomplete {
        class: TravelerClass,
        expected: u64,
        completed: u64,
    },
}

pub type SimResult<T> = Result<T, SimError>;
