// entities.rs - tipos pequeños del tunel

use std::fmt;
use std::ops::{Index, IndexMut};

/// Clase de viajero. Dos clases distintas nunca comparten el tunel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelerClass {
    North,
    South,
    Pedestrian,
}

impl TravelerClass {
    /// Orden fijo de iteración: North, South, Pedestrian.
    pub const ALL: [TravelerClass; 3] = [
        TravelerClass::North,
        TravelerClass::South,
        TravelerClass::Pedestrian,
    ];

    pub fn index(self) -> usize {
        match self {
            TravelerClass::North => 0,
            TravelerClass::South => 1,
            TravelerClass::Pedestrian => 2,
        }
    }

    /// Las otras dos clases, las que decide el predicado de entrada.
    pub fn others(self) -> [TravelerClass; 2] {
        match self {
            TravelerClass::North => [TravelerClass::South, TravelerClass::Pedestrian],
            TravelerClass::South => [TravelerClass::North, TravelerClass::Pedestrian],
            TravelerClass::Pedestrian => [TravelerClass::North, TravelerClass::South],
        }
    }

    /// Etiqueta corta para tablas (`N`, `S`, `P`).
    pub fn short(self) -> char {
        match self {
            TravelerClass::North => 'N',
            TravelerClass::South => 'S',
            TravelerClass::Pedestrian => 'P',
        }
    }
}

impl fmt::Display for TravelerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TravelerClass::North => "car heading N",
            TravelerClass::South => "car heading S",
            TravelerClass::Pedestrian => "pedestrian",
        };
        f.write_str(name)
    }
}

/// Tabla fija `TravelerClass -> u64`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts([u64; 3]);

impl ClassCounts {
    pub fn new(north: u64, south: u64, pedestrian: u64) -> Self {
        Self([north, south, pedestrian])
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Clases con contador distinto de cero.
    pub fn busy_classes(&self) -> Vec<TravelerClass> {
        TravelerClass::ALL
            .into_iter()
            .filter(|c| self[*c] > 0)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TravelerClass, u64)> + '_ {
        TravelerClass::ALL.into_iter().map(move |c| (c, self[c]))
    }
}

impl Index<TravelerClass> for ClassCounts {
    type Output = u64;

    fn index(&self, class: TravelerClass) -> &u64 {
        &self.0[class.index()]
    }
}

impl IndexMut<TravelerClass> for ClassCounts {
    fn index_mut(&mut self, class: TravelerClass) -> &mut u64 {
        &mut self.0[class.index()]
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} S={} P={}",
            self[TravelerClass::North],
            self[TravelerClass::South],
            self[TravelerClass::Pedestrian]
        )
    }
}
