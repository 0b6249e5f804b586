//! World management - grid, chunks, movement rules and the tick scheduler

mod ca_update;
mod cell;
mod chunk;
mod grid;
mod render_sync;
mod rng_trait;
mod stats;
#[allow(clippy::module_inception)]
mod world;

pub use ca_update::{CellularAutomataUpdater, UpdateContext};
pub use cell::{Cell, CellFlags};
pub use chunk::{Chunk, ChunkTracker};
pub use grid::Grid;
pub use render_sync::{ColorBuffer, ColorChange, NoopRenderSync, RenderSync};
pub use rng_trait::WorldRng;
pub use stats::{NoopStats, SimStats, TickStats};
pub use world::World;
