//! Tunel de un solo carril compartido por coches hacia el norte, coches hacia
//! el sur y peatones.
//!
//! - `tunnel`: el monitor (candado + variable de condición) y sus tipos.
//! - `sim`: generadores, viajeros (un hilo cada uno) y el arnés.
//! - `error`: errores del andamiaje; el monitor no tiene.

pub mod error;
pub mod sim;
pub mod tunnel;
