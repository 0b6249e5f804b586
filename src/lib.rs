//! # Sandfall - a falling-sand cellular automaton
//!
//! Every cell of a fixed grid holds a material with physical state
//! (velocity, temperature, remaining life). Each tick moves solids, liquids
//! and gases by local rules and runs heat transfer and combustion.

pub mod config;
pub mod error;
pub mod simulation;
pub mod world;

pub use config::{ScheduleMode, SimConfig};
pub use error::{Result, SandfallError};
pub use world::World;

/// Common imports for internal use
pub mod prelude {
    pub use crate::config::{ScheduleMode, SimConfig};
    pub use crate::simulation::{Material, MaterialType, Materials};
    pub use crate::world::{Cell, RenderSync, World, WorldRng};
    pub use glam::{IVec2, Vec2};
}
