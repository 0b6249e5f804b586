//! Thermal and combustion rules
//!
//! Temperatures are per cell, in degrees. Heat moves two ways: inert
//! materials relax toward their neighborhood average, and combustible
//! materials soak heat from hot orthogonal neighbors until they ignite.

use serde::{Deserialize, Serialize};

use super::color::{self, Color};
use super::Material;
use crate::world::{UpdateContext, WorldRng};

/// Temperature at which wood may catch fire, and below which burning ends
pub const IGNITION_TEMPERATURE: f32 = 300.0;
/// Heat added when a cell ignites
const IGNITION_HEAT: f32 = 300.0;
const IGNITION_CHANCE: f32 = 0.3;
/// Per-neighbor, per-tick chance of absorbing heat
const ABSORB_CHANCE: f32 = 0.15;
/// Fraction of a hot neighbor's temperature absorbed per second
const WOOD_ABSORB_RATE: f32 = 0.5;
/// Neighbors cooler than this give no heat to wood
const WOOD_HEAT_SOURCE_MIN: f32 = 200.0;
/// Structural life lost per second while burning
const WOOD_BURN_LIFE_RATE: f32 = 1.0;
const FLAME_SPAWN_CHANCE: f32 = 0.1;
const BURNT_TO_SMOKE_CHANCE: f32 = 0.2;
/// How fast burning cells darken toward `CHAR_COLOR`, per tick
const CHAR_TINT_RATE: f32 = 0.05;

const LAVA_IGNITE_CHANCE: f32 = 0.02;

const FIRE_TO_SMOKE_CHANCE: f32 = 0.15;
const FIRE_LIFE_PER_TICK: f32 = 1.0;
/// Life at which fire reaches full red
const FIRE_FULL_LIFE: f32 = 30.0;

const SMOKE_LIFE_PER_TICK: f32 = 0.05;

/// Life at or below this counts as expired (absorbs f32 drift)
const LIFE_EPSILON: f32 = 1e-4;
/// Temperature changes smaller than this don't keep a chunk awake.
///
/// Under `ScheduleMode::ActiveChunks` a chunk whose cells only drift by less
/// than this goes to sleep and stops diffusing, so temperatures can end up
/// slightly apart from a whole-grid run. Heat that crosses into a sleeping
/// chunk during a tick is only picked up the tick after, which can also shift
/// when nearby wood ignites. Movement of sand, liquids and gases is unaffected.
const TEMPERATURE_EPSILON: f32 = 0.05;

const EMBER_COLOR: Color = color::rgb(255.0, 161.0, 38.0);
const CHAR_COLOR: Color = color::rgb(90.0, 12.0, 6.0);
const FLAME_RED: Color = color::rgb(255.0, 0.0, 0.0);

/// Thermal step applied to a material each tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalRule {
    /// No thermal behavior (empty, border)
    Inert,
    /// Relaxes toward the neighborhood average (sand, stone, water)
    Diffuse,
    /// Absorbs heat, ignites, burns down (wood)
    Combustible,
    /// Constant heat that occasionally lights the cell above (lava)
    HeatSource,
    /// Short-lived flame that burns out into smoke (fire)
    Flame,
    /// Thins out until gone (smoke)
    Smoke,
}

/// Relax the temperature at (x, y) toward the mean of its non-empty 3x3
/// neighborhood (self included). Returns the applied change.
pub fn diffuse_temperature<R: WorldRng>(
    ctx: &mut UpdateContext<'_, R>,
    x: i32,
    y: i32,
    rate: f32,
) -> f32 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(cell) = ctx.grid.get(x + dx, y + dy) {
                if !cell.material.is_inert() {
                    sum += cell.temperature;
                    count += 1;
                }
            }
        }
    }

    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return 0.0;
    };
    if count == 0 {
        return 0.0;
    }

    let average = sum / count as f32;
    let delta = (average - cell.temperature) * rate.clamp(0.0, 1.0);
    cell.temperature += delta;
    delta
}

/// Soak heat from orthogonal neighbors hotter than `min_temp`.
/// Does nothing while the cell is already burning.
pub fn absorb_heat<R: WorldRng>(
    ctx: &mut UpdateContext<'_, R>,
    x: i32,
    y: i32,
    rate: f32,
    min_temp: f32,
) -> f32 {
    if ctx.grid.get(x, y).map_or(true, |c| c.is_burning()) {
        return 0.0;
    }

    let mut gained = 0.0;
    for (nx, ny) in [(x, y + 1), (x, y - 1), (x - 1, y), (x + 1, y)] {
        let Some(neighbor_temp) = ctx.grid.get(nx, ny).map(|c| c.temperature) else {
            continue;
        };
        if neighbor_temp > min_temp && ctx.rng.check_probability(ABSORB_CHANCE) {
            gained += rate * ctx.dt * neighbor_temp;
        }
    }

    if let Some(cell) = ctx.grid.get_mut(x, y) {
        cell.temperature += gained;
    }
    gained
}

/// Set (x, y) alight: flag it, add a burst of heat and tint it like an ember
pub fn ignite<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) {
    let ember = color::jitter(EMBER_COLOR, ctx.rng);
    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return;
    };
    if cell.is_burning() {
        return;
    }

    cell.set_burning(true);
    cell.temperature += IGNITION_HEAT;
    cell.color = ember;
    ctx.grid.touch_color(x, y);
    ctx.stats.record_ignition();
}

/// Temperature lost by a burning cell in one tick: 4.5 to 7.5, derived from
/// the current temperature
pub fn burn_decay(temperature: f32) -> f32 {
    ((temperature / 4.5) as i32).rem_euclid(4) as f32 + 4.5
}

/// One tick of burning. Returns true when the cell burnt out and was
/// replaced by smoke or empty space.
pub fn burn<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) -> bool {
    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return false;
    };
    if !cell.is_burning() {
        return false;
    }

    cell.temperature -= burn_decay(cell.temperature);
    cell.color = color::lerp(cell.color, CHAR_COLOR, CHAR_TINT_RATE);
    let burnt_out = cell.temperature <= IGNITION_TEMPERATURE;
    ctx.grid.touch_color(x, y);

    if ctx.grid.is_empty(x, y + 1) && ctx.rng.check_probability(FLAME_SPAWN_CHANCE) {
        transmute(ctx, x, y + 1, Material::Fire);
    }

    if burnt_out {
        let ash = if ctx.rng.check_probability(BURNT_TO_SMOKE_CHANCE) {
            Material::Smoke
        } else {
            Material::Empty
        };
        transmute(ctx, x, y, ash);
        return true;
    }

    ctx.grid.report_activity(x, y);
    false
}

/// Wood: absorb heat, maybe ignite, burn, and crumble once its life is spent
pub fn update_wood<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) {
    let gained = absorb_heat(ctx, x, y, WOOD_ABSORB_RATE, WOOD_HEAT_SOURCE_MIN);

    let Some(&cell) = ctx.grid.get(x, y) else {
        return;
    };
    if !cell.is_burning()
        && cell.temperature >= IGNITION_TEMPERATURE
        && ctx.rng.check_probability(IGNITION_CHANCE)
    {
        ignite(ctx, x, y);
    }

    if burn(ctx, x, y) {
        return;
    }

    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return;
    };
    if cell.is_burning() {
        cell.life -= WOOD_BURN_LIFE_RATE * ctx.dt;
    }
    let hot = cell.temperature >= IGNITION_TEMPERATURE;

    if cell.life <= 0.0 {
        transmute(ctx, x, y, Material::Empty);
    } else if hot || gained > 0.0 {
        ctx.grid.report_activity(x, y);
    }
}

/// Lava: occasionally light the empty cell above it
pub fn update_lava<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) {
    if ctx.grid.is_empty(x, y + 1) && ctx.rng.check_probability(LAVA_IGNITE_CHANCE) {
        transmute(ctx, x, y + 1, Material::Fire);
    }
    ctx.grid.report_activity(x, y);
}

/// Fire: redden with age and lose one life per tick. Returns false when the
/// flame went out and the cell no longer holds fire.
pub fn update_fire<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) -> bool {
    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return false;
    };

    let age = (1.0 - cell.life / FIRE_FULL_LIFE).clamp(0.0, 1.0);
    cell.color = color::lerp(cell.color, FLAME_RED, age * 0.5);
    cell.life -= FIRE_LIFE_PER_TICK;
    let expired = cell.life <= LIFE_EPSILON;
    ctx.grid.touch_color(x, y);

    if expired {
        let remains = if ctx.rng.check_probability(FIRE_TO_SMOKE_CHANCE) {
            Material::Smoke
        } else {
            Material::Empty
        };
        transmute(ctx, x, y, remains);
        return false;
    }

    ctx.grid.report_activity(x, y);
    true
}

/// Smoke: thin out. Returns false once it has vanished.
pub fn update_smoke<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32) -> bool {
    let Some(cell) = ctx.grid.get_mut(x, y) else {
        return false;
    };

    cell.life -= SMOKE_LIFE_PER_TICK;
    if cell.life <= LIFE_EPSILON {
        transmute(ctx, x, y, Material::Empty);
        return false;
    }

    ctx.grid.report_activity(x, y);
    true
}

/// Inert materials equalize with their surroundings
pub fn update_diffuse<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32, rate: f32) {
    let delta = diffuse_temperature(ctx, x, y, rate * ctx.dt);
    if delta.abs() > TEMPERATURE_EPSILON {
        ctx.grid.report_activity(x, y);
    }
}

fn transmute<R: WorldRng>(ctx: &mut UpdateContext<'_, R>, x: i32, y: i32, material: Material) {
    if ctx.grid.replace(x, y, material, ctx.materials, ctx.rng) {
        ctx.stats.record_transmutation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Materials;
    use crate::world::{Cell, Grid, TickStats};

    /// Scripted RNG: every probability gate passes or fails together
    struct GateRng {
        pass: bool,
    }

    impl WorldRng for GateRng {
        fn gen_bool(&mut self) -> bool {
            true
        }

        fn gen_f32(&mut self) -> f32 {
            0.5
        }

        fn check_probability(&mut self, _probability: f32) -> bool {
            self.pass
        }
    }

    struct Fixture {
        grid: Grid,
        materials: Materials,
        rng: GateRng,
        stats: TickStats,
    }

    impl Fixture {
        fn new(pass: bool) -> Self {
            let materials = Materials::new();
            Self {
                grid: Grid::new(7, 7, 4, &materials).unwrap(),
                materials,
                rng: GateRng { pass },
                stats: TickStats::default(),
            }
        }

        fn place(&mut self, x: i32, y: i32, material: Material, temperature: f32) {
            self.grid.set(
                x,
                y,
                Cell {
                    material,
                    temperature,
                    life: 10.0,
                    ..Cell::EMPTY
                },
            );
        }

        fn ctx(&mut self) -> UpdateContext<'_, GateRng> {
            UpdateContext {
                grid: &mut self.grid,
                materials: &self.materials,
                rng: &mut self.rng,
                stats: &mut self.stats,
                dt: 1.0 / 60.0,
                gravity: 9.81,
            }
        }
    }

    #[test]
    fn test_burn_decay_is_bounded() {
        for t in 300..2000 {
            let decay = burn_decay(t as f32);
            assert!((4.5..=7.5).contains(&decay));
        }
        // (int)(310 / 4.5) = 68, 68 mod 4 = 0
        assert_eq!(burn_decay(310.0), 4.5);
        assert_eq!(burn_decay(315.0), 6.5);
    }

    #[test]
    fn test_diffuse_moves_toward_average() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Stone, 100.0);
        f.place(4, 3, Material::Stone, 0.0);

        let delta = diffuse_temperature(&mut f.ctx(), 3, 3, 0.5);

        assert_eq!(delta, -25.0);
        assert_eq!(f.grid.get(3, 3).unwrap().temperature, 75.0);
    }

    #[test]
    fn test_diffuse_ignores_empty_neighbors() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Stone, 100.0);

        let delta = diffuse_temperature(&mut f.ctx(), 3, 3, 1.0);

        assert_eq!(delta, 0.0);
        assert_eq!(f.grid.get(3, 3).unwrap().temperature, 100.0);
    }

    #[test]
    fn test_absorb_heat_from_hot_neighbors() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 20.0);
        f.place(3, 4, Material::Lava, 1000.0);
        f.place(2, 3, Material::Stone, 50.0);

        let gained = absorb_heat(&mut f.ctx(), 3, 3, 0.6, 200.0);

        assert!((gained - 10.0).abs() < 1e-3);
        assert!((f.grid.get(3, 3).unwrap().temperature - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_absorb_heat_skipped_while_burning() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 20.0);
        f.place(3, 4, Material::Lava, 1000.0);
        f.grid.get_mut(3, 3).unwrap().set_burning(true);

        assert_eq!(absorb_heat(&mut f.ctx(), 3, 3, 0.6, 200.0), 0.0);
    }

    #[test]
    fn test_ignite_once() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 310.0);

        ignite(&mut f.ctx(), 3, 3);
        ignite(&mut f.ctx(), 3, 3);

        let cell = f.grid.get(3, 3).unwrap();
        assert!(cell.is_burning());
        assert_eq!(cell.temperature, 610.0);
        assert_eq!(f.stats.ignitions, 1);
    }

    #[test]
    fn test_burn_spawns_flame_and_cools() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 610.0);
        f.grid.get_mut(3, 3).unwrap().set_burning(true);

        assert!(!burn(&mut f.ctx(), 3, 3));

        assert!(f.grid.get(3, 3).unwrap().temperature < 610.0);
        assert_eq!(f.grid.material(3, 4), Material::Fire);
    }

    #[test]
    fn test_burn_out_leaves_smoke_or_nothing() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 302.0);
        f.grid.get_mut(3, 3).unwrap().set_burning(true);

        assert!(burn(&mut f.ctx(), 3, 3));
        assert_eq!(f.grid.material(3, 3), Material::Smoke);
        assert!(!f.grid.get(3, 3).unwrap().is_burning());

        let mut f = Fixture::new(false);
        f.place(3, 3, Material::Wood, 302.0);
        f.grid.get_mut(3, 3).unwrap().set_burning(true);

        assert!(burn(&mut f.ctx(), 3, 3));
        assert_eq!(f.grid.material(3, 3), Material::Empty);
    }

    #[test]
    fn test_wood_below_threshold_does_not_ignite() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Wood, 250.0);

        update_wood(&mut f.ctx(), 3, 3);

        assert!(!f.grid.get(3, 3).unwrap().is_burning());
        assert_eq!(f.grid.material(3, 3), Material::Wood);
    }

    #[test]
    fn test_wood_crumbles_when_life_spent() {
        let mut f = Fixture::new(false);
        f.place(3, 3, Material::Wood, 20.0);
        f.grid.get_mut(3, 3).unwrap().life = 0.0;

        update_wood(&mut f.ctx(), 3, 3);

        assert_eq!(f.grid.material(3, 3), Material::Empty);
        assert_eq!(f.stats.transmutations, 1);
    }

    #[test]
    fn test_lava_lights_cell_above() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Lava, 1100.0);

        update_lava(&mut f.ctx(), 3, 3);

        assert_eq!(f.grid.material(3, 4), Material::Fire);
    }

    #[test]
    fn test_fire_expires() {
        let mut f = Fixture::new(false);
        f.place(3, 3, Material::Fire, 950.0);
        f.grid.get_mut(3, 3).unwrap().life = 1.0;

        assert!(!update_fire(&mut f.ctx(), 3, 3));
        assert_eq!(f.grid.material(3, 3), Material::Empty);
    }

    #[test]
    fn test_fire_reddens_with_age() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Fire, 950.0);
        f.grid.get_mut(3, 3).unwrap().color = color::rgb(212.0, 120.0, 70.0);

        assert!(update_fire(&mut f.ctx(), 3, 3));
        let cell = f.grid.get(3, 3).unwrap();
        assert!(cell.color.y < 120.0);
        assert_eq!(cell.life, 9.0);
    }

    #[test]
    fn test_smoke_thins_out() {
        let mut f = Fixture::new(true);
        f.place(3, 3, Material::Smoke, 30.0);
        f.grid.get_mut(3, 3).unwrap().life = 0.1;

        assert!(update_smoke(&mut f.ctx(), 3, 3));
        assert!(!update_smoke(&mut f.ctx(), 3, 3));
        assert_eq!(f.grid.material(3, 3), Material::Empty);
    }
}
