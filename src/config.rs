//! Simulation configuration
//!
//! Compiled defaults can be overridden from a RON document. Every field is
//! optional in the document; missing fields keep their default value.
//!
//! ```ron
//! (
//!     gravity: 12.0,
//!     chunk_size: 32,
//!     schedule_mode: ActiveChunks,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which cells the scheduler visits each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScheduleMode {
    /// Every row, bottom to top. Always correct, used as the reference.
    #[default]
    WholeGrid,
    /// Only chunks that reported activity during the previous tick.
    ActiveChunks,
}

/// Tunables for a world instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Downward acceleration in cells/sec^2
    pub gravity: f32,
    /// Side length of a square chunk, in cells
    pub chunk_size: usize,
    pub schedule_mode: ScheduleMode,
    /// Seed for the world's random generator
    pub seed: u64,
    /// Fraction of brush cells that receive a gas (sparse placement)
    pub gas_brush_density: f32,
    /// Temperature equalization rate per second for inert materials
    pub diffusion_rate: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            chunk_size: 16,
            schedule_mode: ScheduleMode::WholeGrid,
            seed: 42,
            gas_brush_density: 0.2,
            diffusion_rate: 0.5,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration file, falling back to defaults for missing fields
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded simulation config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn with_schedule_mode(mut self, mode: ScheduleMode) -> Self {
        self.schedule_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.schedule_mode, ScheduleMode::WholeGrid);
        assert!((config.gravity - 9.81).abs() < f32::EPSILON);
        assert!((config.gas_brush_density - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config =
            SimConfig::from_ron_str("(chunk_size: 32, schedule_mode: ActiveChunks)").unwrap();
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.schedule_mode, ScheduleMode::ActiveChunks);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_invalid_ron_is_an_error() {
        assert!(SimConfig::from_ron_str("(chunk_size: \"big\")").is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let config = SimConfig::default()
            .with_seed(7)
            .with_schedule_mode(ScheduleMode::ActiveChunks);
        assert_eq!(config.seed, 7);
        assert_eq!(config.schedule_mode, ScheduleMode::ActiveChunks);
    }
}
