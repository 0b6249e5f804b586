//! World - owns the grid, the material registry and the tick scheduler

use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use super::{
    Cell, CellularAutomataUpdater, Grid, NoopStats, RenderSync, SimStats, TickStats,
    UpdateContext, WorldRng,
};
use crate::config::{ScheduleMode, SimConfig};
use crate::error::Result;
use crate::simulation::{color, temperature, Material, MaterialType, Materials, ThermalRule};

/// A falling-sand world
///
/// One [`World::advance`] call runs exactly one scheduler cycle:
/// scan, dispatch, clear the moved flags, rotate chunk activity.
pub struct World<R: WorldRng = Xoshiro256StarStar> {
    grid: Grid,

    /// Material definitions
    materials: Materials,

    config: SimConfig,

    rng: R,

    /// Material used by [`World::paint`]
    active_material: Material,

    tick_count: u64,
    last_tick_stats: TickStats,
}

impl World {
    /// Build a world with default configuration
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, SimConfig::default())
    }

    /// Build a world seeded from `config.seed`
    pub fn with_config(width: usize, height: usize, config: SimConfig) -> Result<Self> {
        let rng = Xoshiro256StarStar::seed_from_u64(config.seed);
        World::with_rng(width, height, config, rng)
    }
}

impl<R: WorldRng> World<R> {
    /// Build a world around a caller-supplied random source
    pub fn with_rng(width: usize, height: usize, config: SimConfig, rng: R) -> Result<Self> {
        let materials = Materials::new();
        let grid = Grid::new(width, height, config.chunk_size, &materials)?;

        let (chunks_wide, chunks_high) = grid.chunks().dimensions();
        log::info!(
            "Created {}x{} world: {}x{} chunks of {}, {:?}, seed {}",
            width,
            height,
            chunks_wide,
            chunks_high,
            config.chunk_size,
            config.schedule_mode,
            config.seed
        );

        Ok(Self {
            grid,
            materials,
            config,
            rng,
            active_material: Material::Sand,
            tick_count: 0,
            last_tick_stats: TickStats::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Counters from the most recent [`World::advance`]
    pub fn last_tick_stats(&self) -> TickStats {
        self.last_tick_stats
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    pub fn material_at(&self, x: i32, y: i32) -> Material {
        self.grid.material(x, y)
    }

    /// Overwrite a cell with a fully specified state. Border cells and
    /// out-of-bounds coordinates are ignored.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if !self.grid.set(x, y, cell) {
            return false;
        }
        self.grid.chunks_mut().wake(x, y);
        true
    }

    /// Place one freshly created `material` cell at (x, y), replacing
    /// whatever is there. Border cells can't be placed or overwritten.
    ///
    /// Brush edits wake their chunk for the very next tick.
    pub fn place(&mut self, x: i32, y: i32, material: Material) -> bool {
        if material == Material::Border || self.grid.get_mut(x, y).is_none() {
            return false;
        }
        let cell = self.materials.create(material, &mut self.rng);
        self.grid.chunks_mut().wake(x, y);
        self.grid.set(x, y, cell)
    }

    /// Switch scan order. Entering chunk mode wakes every chunk so nothing
    /// that was moving under the whole-grid scan is left asleep.
    pub fn set_schedule_mode(&mut self, mode: ScheduleMode) {
        if mode == self.config.schedule_mode {
            return;
        }
        log::debug!("Schedule mode {:?} -> {:?}", self.config.schedule_mode, mode);
        self.config.schedule_mode = mode;
        if mode == ScheduleMode::ActiveChunks {
            self.grid.chunks_mut().wake_all();
        }
    }

    // ===== Brush =====

    pub fn active_material(&self) -> Material {
        self.active_material
    }

    /// Select the material used by [`World::paint`]
    pub fn set_active_material(&mut self, material: Material) {
        log::debug!(
            "Active material: {} -> {}",
            self.active_material.name(),
            material.name()
        );
        self.active_material = material;
    }

    /// Paint the active material with a circular brush
    pub fn paint(&mut self, center_x: i32, center_y: i32, radius: i32) -> usize {
        self.paint_circle(center_x, center_y, radius, self.active_material)
    }

    /// Place `material` in every empty cell strictly inside the circle.
    ///
    /// Gases land on only a fraction of the candidate cells
    /// (`gas_brush_density`). Painting `Empty` erases every non-border cell
    /// in the circle. Returns the number of cells written.
    pub fn paint_circle(
        &mut self,
        center_x: i32,
        center_y: i32,
        radius: i32,
        material: Material,
    ) -> usize {
        if material == Material::Border {
            log::debug!("Ignoring border brush at ({}, {})", center_x, center_y);
            return 0;
        }

        let eraser = material == Material::Empty;
        let sparse = self.materials.category_of(material) == MaterialType::Gas;

        // Only the part of the bounding square that overlaps the interior is
        // walked; i64 keeps the distance test exact for any i32 input
        let r = i64::from(radius.max(0));
        let r2 = r * r;
        let (cx, cy) = (i64::from(center_x), i64::from(center_y));
        let (max_x, max_y) = (self.grid.width() as i64 - 2, self.grid.height() as i64 - 2);
        let (x0, x1) = ((cx - r).max(1), (cx + r).min(max_x));
        let (y0, y1) = ((cy - r).max(1), (cy + r).min(max_y));
        let mut placed = 0;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy >= r2 {
                    continue;
                }
                let (x, y) = (x as i32, y as i32);

                let target = match self.grid.get_mut(x, y) {
                    Some(cell) => cell.material,
                    None => continue,
                };
                if eraser == (target == Material::Empty) {
                    continue;
                }
                if sparse && !self.rng.check_probability(self.config.gas_brush_density) {
                    continue;
                }

                let cell = self.materials.create(material, &mut self.rng);
                if self.grid.set(x, y, cell) {
                    self.grid.chunks_mut().wake(x, y);
                    placed += 1;
                }
            }
        }

        log::debug!(
            "Painted {} {} cells at ({}, {}) r={}",
            placed,
            material.name(),
            center_x,
            center_y,
            radius
        );
        placed
    }

    /// Overwrite every interior cell with `material`
    pub fn fill_all(&mut self, material: Material) {
        if material == Material::Border {
            log::debug!("Ignoring border fill");
            return;
        }

        let (w, h) = (self.grid.width() as i32, self.grid.height() as i32);
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let cell = self.materials.create(material, &mut self.rng);
                self.grid.set(x, y, cell);
            }
        }
        self.grid.chunks_mut().wake_all();
        log::debug!("Filled world with {}", material.name());
    }

    pub fn clear_all(&mut self) {
        self.fill_all(Material::Empty);
    }

    // ===== Render sync =====

    /// Forward queued color changes to `sink`. Returns how many were sent.
    pub fn sync_colors(&mut self, sink: &mut dyn RenderSync) -> usize {
        let mut sent = 0;
        for change in self.grid.drain_color_changes() {
            sink.on_cell_color_changed(change.index, change.rgba);
            sent += 1;
        }
        sent
    }

    /// Report the color of every cell, for a renderer starting from scratch
    pub fn snapshot_colors(&self, sink: &mut dyn RenderSync) {
        for (index, cell) in self.grid.cells().iter().enumerate() {
            sink.on_cell_color_changed(index, color::to_rgba8(cell.color));
        }
    }

    // ===== Tick =====

    /// Run one scheduler cycle advancing the simulation by `dt` seconds.
    ///
    /// Rows are visited bottom to top, each in a random horizontal
    /// direction. In [`ScheduleMode::ActiveChunks`] the row segments of
    /// sleeping chunks are skipped; the visiting order of everything else is
    /// the same as a whole-grid scan.
    ///
    /// A non-positive `dt` is a frozen tick: nothing is scanned and chunk
    /// activity is carried over unchanged.
    pub fn advance(&mut self, dt: f32) {
        self.advance_observed(dt, &mut NoopStats);
    }

    /// [`World::advance`], also reporting every move, transmutation and
    /// ignition of the tick to `observer`
    pub fn advance_observed(&mut self, dt: f32, observer: &mut dyn SimStats) {
        let mut stats = TickStats::default();
        let frozen = dt <= 0.0;

        if !frozen {
            let mode = self.config.schedule_mode;
            let chunks = self.grid.chunks();
            stats.chunks_scanned = match mode {
                ScheduleMode::WholeGrid => chunks.chunks().len() as u32,
                ScheduleMode::ActiveChunks => chunks.active_count() as u32,
            };

            let diffusion_rate = self.config.diffusion_rate;
            let height = self.grid.height() as i32;
            let mut recorder = Recorder {
                tick: &mut stats,
                observer,
            };
            let mut ctx = UpdateContext {
                grid: &mut self.grid,
                materials: &self.materials,
                rng: &mut self.rng,
                stats: &mut recorder,
                dt,
                gravity: self.config.gravity,
            };

            for y in 1..height - 1 {
                scan_row(&mut ctx, y, mode, diffusion_rate);
            }
        }

        self.grid.clear_moved_flags();
        if !frozen {
            self.grid.chunks_mut().advance_and_reset();
        }

        self.tick_count += 1;
        log::trace!(
            "Tick {}: {} moved, {} transmuted, {} ignited, {} chunks scanned",
            self.tick_count,
            stats.cells_moved,
            stats.transmutations,
            stats.ignitions,
            stats.chunks_scanned
        );
        self.last_tick_stats = stats;
    }
}

/// Feeds the world's own counters and a caller's observer together
struct Recorder<'a> {
    tick: &'a mut TickStats,
    observer: &'a mut dyn SimStats,
}

impl SimStats for Recorder<'_> {
    fn record_cell_moved(&mut self) {
        self.tick.record_cell_moved();
        self.observer.record_cell_moved();
    }

    fn record_move(&mut self, from: IVec2, to: IVec2) {
        self.tick.record_move(from, to);
        self.observer.record_move(from, to);
    }

    fn record_transmutation(&mut self) {
        self.tick.record_transmutation();
        self.observer.record_transmutation();
    }

    fn record_ignition(&mut self) {
        self.tick.record_ignition();
        self.observer.record_ignition();
    }
}

/// Visit the interior of row `y`, one chunk-wide segment at a time
fn scan_row<R: WorldRng>(
    ctx: &mut UpdateContext<'_, R>,
    y: i32,
    mode: ScheduleMode,
    diffusion_rate: f32,
) {
    let left_to_right = ctx.rng.gen_bool();
    let max_x = ctx.grid.width() as i32 - 1;
    let size = ctx.grid.chunks().chunk_size() as i32;
    let (chunks_wide, _) = ctx.grid.chunks().dimensions();
    let chunks_wide = chunks_wide as i32;

    for k in 0..chunks_wide {
        let cx = if left_to_right { k } else { chunks_wide - 1 - k };
        let start = (cx * size).max(1);
        let end = ((cx + 1) * size).min(max_x);
        if start >= end {
            continue;
        }
        if mode == ScheduleMode::ActiveChunks
            && !ctx
                .grid
                .chunks()
                .chunk_at(start, y)
                .is_some_and(|c| c.should_update)
        {
            continue;
        }

        for i in 0..end - start {
            let x = if left_to_right { start + i } else { end - 1 - i };
            update_cell(ctx, x, y, diffusion_rate);
        }
    }
}

/// Dispatch one cell: lifetime countdown, movement by category, then the
/// material's thermal step at wherever the cell ended up
fn update_cell<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32, diffusion_rate: f32) {
    let Some(&cell) = ctx.grid.get(x, y) else {
        return;
    };
    if cell.material.is_inert() || cell.moved_this_tick() {
        return;
    }

    let def = ctx.materials.get(cell.material);
    let (category, thermal, resistance) = (def.material_type, def.thermal, def.inertial_resistance);

    let alive = match thermal {
        ThermalRule::Flame => temperature::update_fire(ctx, x, y),
        ThermalRule::Smoke => temperature::update_smoke(ctx, x, y),
        _ => true,
    };
    if !alive {
        return;
    }

    let pos = match category {
        // Burning wood holds its place until it burns out
        MaterialType::Solid if cell.is_burning() => IVec2::new(x, y),
        MaterialType::Solid => CellularAutomataUpdater::update_solid(ctx, x, y, resistance),
        MaterialType::Liquid => CellularAutomataUpdater::update_liquid(ctx, x, y),
        MaterialType::Gas => CellularAutomataUpdater::update_gas(ctx, x, y),
    };

    match thermal {
        ThermalRule::Diffuse => temperature::update_diffuse(ctx, pos.x, pos.y, diffusion_rate),
        ThermalRule::Combustible => temperature::update_wood(ctx, pos.x, pos.y),
        ThermalRule::HeatSource => temperature::update_lava(ctx, pos.x, pos.y),
        ThermalRule::Inert | ThermalRule::Flame | ThermalRule::Smoke => {}
    }
}
