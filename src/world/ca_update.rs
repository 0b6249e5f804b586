//! Cellular automata update logic - material movement physics

use bresenham::Bresenham;
use glam::IVec2;

use super::{Grid, SimStats, WorldRng};
use crate::simulation::{Material, Materials};

/// Speed below which a resting solid stops sliding
const SLIDE_THRESHOLD: f32 = 0.1;
/// Horizontal damping per slide sub-step
const SLIDE_DAMPING: f32 = 0.26;
/// Horizontal damping per falling tick
const FALL_DAMPING: f32 = 0.3;
/// Largest horizontal speed produced by a landing
const LANDING_SPREAD: f32 = 2.0;
const MIN_FALL_SPEED: f32 = -10.0;
const MAX_FALL_SPEED: f32 = 50.0;
/// Chance a gas accepts each candidate move
const GAS_MOVE_CHANCE: f32 = 0.5;

/// Everything a rule may touch while resolving one cell
pub struct UpdateContext<'a, R: WorldRng> {
    pub grid: &'a mut Grid,
    pub materials: &'a Materials,
    pub rng: &'a mut R,
    pub stats: &'a mut dyn SimStats,
    /// Seconds advanced by this tick
    pub dt: f32,
    pub gravity: f32,
}

/// Cellular automata updater - handles material movement physics
///
/// Every rule returns the position the cell ended up at so the thermal step
/// can follow it.
pub struct CellularAutomataUpdater;

impl CellularAutomataUpdater {
    /// Update a solid: velocity-integrated fall, landing spread, sliding
    pub fn update_solid<R: WorldRng>(
        ctx: &mut UpdateContext<'_, R>,
        x: i32,
        y: i32,
        inertial_resistance: f32,
    ) -> IVec2 {
        let Some(&start) = ctx.grid.get(x, y) else {
            return IVec2::new(x, y);
        };
        let mut cell = start;
        let mut pos = IVec2::new(x, y);
        let below_empty = ctx.grid.is_empty(x, y - 1);

        // Landing: trade vertical speed for a random sideways push
        if !below_empty && cell.is_falling() {
            cell.velocity.x = ctx.rng.gen_range(-1.0, 1.0) * LANDING_SPREAD;
            cell.velocity.y /= 2.0;
        }

        if !cell.is_falling() {
            cell.velocity.y = 0.0;
            if cell.velocity.x.abs() < SLIDE_THRESHOLD {
                cell.velocity.x = 0.0;
            }

            if below_empty {
                cell.set_falling(true);
            } else if cell.velocity.x != 0.0 {
                let dir = if cell.velocity.x > 0.0 { 1 } else { -1 };
                let steps = cell.velocity.x.abs().ceil() as i32;
                let mut last_good = 0;

                for i in 1..=steps {
                    let nx = x + dir * i;
                    if ctx.grid.is_empty(nx, y - 1) {
                        cell.set_falling(true);
                        break;
                    }
                    if ctx.grid.is_empty(nx, y) {
                        last_good = i;
                    } else {
                        // Bounce off the obstacle, losing some speed
                        let damp = ctx.rng.gen_range(0.1, 0.2);
                        let speed = (cell.velocity.x.abs() - damp).max(0.0);
                        cell.velocity.x = -(dir as f32) * speed;
                        break;
                    }
                    cell.velocity.x -= cell.velocity.x * SLIDE_DAMPING;
                }

                if last_good != 0 {
                    let target = IVec2::new(x + dir * last_good, y);
                    pos = Self::move_cell(ctx, cell, pos, target);
                }
            }
        }

        if cell.is_falling() && pos == IVec2::new(x, y) {
            let below_solid = Self::is_support(ctx.grid, x, y - 1);
            cell.velocity.y = Self::update_velocity(cell.velocity.y, ctx.gravity, ctx.dt, below_solid);

            if below_empty {
                let target = Self::fall_target(ctx.grid, pos, cell.velocity.x, cell.velocity.y);
                let mut last_good = pos;
                for step in Self::walk(pos, target) {
                    if !ctx.grid.is_empty(step.x, step.y) {
                        break;
                    }
                    last_good = step;
                }
                if last_good == pos {
                    last_good = IVec2::new(x, y - 1);
                }

                cell.velocity.x -= cell.velocity.x * FALL_DAMPING;
                pos = Self::move_cell(ctx, cell, pos, last_good);

                for step in Self::walk(IVec2::new(x, y), last_good) {
                    Self::set_surrounding_falling(ctx, step.x, step.y, inertial_resistance);
                }
                Self::set_surrounding_falling(ctx, x, y, inertial_resistance);
            } else {
                let left = ctx.grid.is_empty(x - 1, y - 1);
                let right = ctx.grid.is_empty(x + 1, y - 1);
                let dx = match (left, right) {
                    (true, true) => {
                        if ctx.rng.gen_bool() {
                            -1
                        } else {
                            1
                        }
                    }
                    (true, false) => -1,
                    (false, true) => 1,
                    (false, false) => 0,
                };

                if dx != 0 {
                    pos = Self::move_cell(ctx, cell, pos, IVec2::new(x + dx, y - 1));
                    Self::set_surrounding_falling(ctx, x, y, inertial_resistance);
                }
            }
        }

        if pos == IVec2::new(x, y) {
            if let Some(slot) = ctx.grid.get_mut(x, y) {
                *slot = cell;
            }
        }

        // Whatever now occupies the starting slot stops falling; a cell that
        // actually moved keeps its flag and lands next tick.
        if let Some(origin) = ctx.grid.get_mut(x, y) {
            origin.set_falling(false);
        }

        if ctx.grid.get(pos.x, pos.y).is_some_and(|c| c.velocity != glam::Vec2::ZERO) {
            ctx.grid.report_activity(pos.x, pos.y);
        }

        pos
    }

    /// Update a liquid: straight down, else one cell sideways
    pub fn update_liquid<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) -> IVec2 {
        if Self::try_move(ctx, x, y, x, y - 1) {
            return IVec2::new(x, y - 1);
        }

        let dx = if ctx.rng.gen_bool() { 1 } else { -1 };
        if Self::try_move(ctx, x, y, x + dx, y) {
            return IVec2::new(x + dx, y);
        }

        IVec2::new(x, y)
    }

    /// Update a gas: up, sideways, other side, diagonals; each move is a coin flip
    pub fn update_gas<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) -> IVec2 {
        let dx = if ctx.rng.gen_bool() { 1 } else { -1 };

        for (ox, oy) in [(0, 1), (dx, 0), (-dx, 0), (dx, 1), (-dx, 1)] {
            let (tx, ty) = (x + ox, y + oy);
            if ctx.grid.is_empty(tx, ty)
                && ctx.rng.check_probability(GAS_MOVE_CHANCE)
                && Self::try_move(ctx, x, y, tx, ty)
            {
                return IVec2::new(tx, ty);
            }
        }

        IVec2::new(x, y)
    }

    /// Knock the up/left/right neighbors of (x, y) loose, each resisting
    /// with `inertial_resistance` probability
    pub fn set_surrounding_falling<R: WorldRng>(
        ctx: &mut UpdateContext<'_, R>,
        x: i32,
        y: i32,
        inertial_resistance: f32,
    ) {
        for (nx, ny) in [(x, y + 1), (x - 1, y), (x + 1, y)] {
            let movable = ctx
                .grid
                .get(nx, ny)
                .is_some_and(|c| !c.material.is_inert());
            if !movable || !ctx.rng.check_probability(1.0 - inertial_resistance) {
                continue;
            }
            if let Some(neighbor) = ctx.grid.get_mut(nx, ny) {
                neighbor.set_falling(true);
                ctx.grid.report_activity(nx, ny);
            }
        }
    }

    /// Integrate gravity into the downward speed
    fn update_velocity(vy: f32, gravity: f32, dt: f32, below_solid: bool) -> f32 {
        let vy = (vy + gravity * dt).clamp(MIN_FALL_SPEED, MAX_FALL_SPEED);
        if below_solid {
            vy / 1.25
        } else {
            vy
        }
    }

    /// Occupied by something that isn't a gas
    fn is_support(grid: &Grid, x: i32, y: i32) -> bool {
        grid.in_bounds(x, y)
            && !matches!(
                grid.material(x, y),
                Material::Empty | Material::Smoke | Material::Fire
            )
    }

    /// Integer fall target for one tick, clamped to the grid
    fn fall_target(grid: &Grid, pos: IVec2, vx: f32, vy: f32) -> IVec2 {
        let max = IVec2::new(grid.width() as i32 - 1, grid.height() as i32 - 1);
        (pos + IVec2::new(vx.round() as i32, -(vy.round() as i32))).clamp(IVec2::ZERO, max)
    }

    /// Cells on the line from `from` to `to`, excluding `from`, including `to`
    fn walk(from: IVec2, to: IVec2) -> impl Iterator<Item = IVec2> {
        let end = (to.x as isize, to.y as isize);
        let tail = (from != to).then_some(to);
        Bresenham::new((from.x as isize, from.y as isize), end)
            .skip(1)
            .map(|(x, y)| IVec2::new(x as i32, y as i32))
            .chain(tail)
    }

    /// Write back the working copy and swap it to `to`
    fn move_cell<R: WorldRng>(
        ctx: &mut UpdateContext<'_, R>,
        cell: super::Cell,
        from: IVec2,
        to: IVec2,
    ) -> IVec2 {
        if let Some(slot) = ctx.grid.get_mut(from.x, from.y) {
            *slot = cell;
        }
        if Self::try_move(ctx, from.x, from.y, to.x, to.y) {
            to
        } else {
            from
        }
    }

    /// Try to move a cell into an empty position
    /// Returns true if the move succeeded
    fn try_move<R: WorldRng>(
        ctx: &mut UpdateContext<'_, R>,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> bool {
        if !ctx.grid.is_empty(to_x, to_y) {
            return false;
        }
        if ctx.grid.swap(from_x, from_y, to_x, to_y) {
            ctx.stats
                .record_move(IVec2::new(from_x, from_y), IVec2::new(to_x, to_y));
            return true;
        }
        false
    }
}
