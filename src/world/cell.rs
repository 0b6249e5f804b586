//! Cell - the state held at one grid position

use bitflags::bitflags;
use glam::{Vec2, Vec4};

use crate::simulation::{Color, Material};

bitflags! {
    /// Flag bits for cell state
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Already resolved this tick
        const MOVED = 1 << 0;
        /// Currently on fire
        const BURNING = 1 << 1;
        /// In free-fall
        const FALLING = 1 << 2;
    }
}

/// A single cell in the grid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub material: Material,
    pub color: Color,
    /// Cells per second; only meaningful for solids
    pub velocity: Vec2,
    pub temperature: f32,
    /// Remaining fuel or lifetime
    pub life: f32,
    pub flags: CellFlags,
}

impl Cell {
    /// Black empty cell at room temperature; registry constructors start from it
    pub const EMPTY: Cell = Cell {
        material: Material::Empty,
        color: Vec4::new(0.0, 0.0, 0.0, 255.0),
        velocity: Vec2::ZERO,
        temperature: 20.0,
        life: 0.0,
        flags: CellFlags::empty(),
    };

    pub fn is_empty(&self) -> bool {
        self.material == Material::Empty
    }

    #[inline]
    pub fn moved_this_tick(&self) -> bool {
        self.flags.contains(CellFlags::MOVED)
    }

    #[inline]
    pub fn is_burning(&self) -> bool {
        self.flags.contains(CellFlags::BURNING)
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.flags.contains(CellFlags::FALLING)
    }

    #[inline]
    pub fn set_moved(&mut self, moved: bool) {
        self.flags.set(CellFlags::MOVED, moved);
    }

    #[inline]
    pub fn set_burning(&mut self, burning: bool) {
        self.flags.set(CellFlags::BURNING, burning);
    }

    #[inline]
    pub fn set_falling(&mut self, falling: bool) {
        self.flags.set(CellFlags::FALLING, falling);
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}
