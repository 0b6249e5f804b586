//! Simulation systems - materials, colors, temperature and combustion

pub mod color;
mod materials;
pub mod temperature;

pub use color::Color;
pub use materials::{Material, MaterialDef, MaterialType, Materials};
pub use temperature::{ThermalRule, IGNITION_TEMPERATURE};
