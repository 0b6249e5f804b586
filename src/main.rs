use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use sandfall::prelude::*;
use sandfall::world::ColorBuffer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid width in cells, border included
    #[arg(long, default_value_t = 320)]
    width: usize,

    /// Grid height in cells, border included
    #[arg(long, default_value_t = 180)]
    height: usize,

    /// Number of ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured scan order
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// RON file with simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Extra material (by name) dropped into the middle of the scene
    #[arg(long)]
    drop: Option<String>,

    /// Log material populations every N ticks (0 = only at the end)
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    WholeGrid,
    ActiveChunks,
}

impl From<Mode> for ScheduleMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::WholeGrid => ScheduleMode::WholeGrid,
            Mode::ActiveChunks => ScheduleMode::ActiveChunks,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(mode) = args.mode {
        config = config.with_schedule_mode(mode.into());
    }

    let mut world = World::with_config(args.width, args.height, config)
        .context("failed to create world")?;
    build_scene(&mut world);

    if let Some(name) = &args.drop {
        let material = Material::from_name(name)
            .with_context(|| format!("unknown material '{name}'"))?;
        world.set_active_material(material);
        let placed = world.paint(args.width as i32 / 2, args.height as i32 * 2 / 3, 8);
        log::info!("Dropped {} {} cells", placed, material.name());
    }

    let mut colors = ColorBuffer::new(args.width * args.height);
    world.snapshot_colors(&mut colors);
    world.sync_colors(&mut colors);

    log::info!("Running {} ticks at dt={}", args.ticks, args.dt);
    let started = Instant::now();
    let mut total_moved = 0u64;

    for tick in 1..=args.ticks {
        world.advance(args.dt);
        world.sync_colors(&mut colors);

        let stats = world.last_tick_stats();
        total_moved += u64::from(stats.cells_moved);

        if args.report_every > 0 && tick % args.report_every == 0 {
            log::info!(
                "Tick {}: {} (chunks scanned: {})",
                tick,
                populations(&world),
                stats.chunks_scanned
            );
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "Finished {} ticks in {:.2?} ({} cell moves): {}",
        args.ticks,
        elapsed,
        total_moved,
        populations(&world)
    );
    Ok(())
}

/// Stone shelf, a sand heap, a water blob, a wood beam over a lava pool and
/// a puff of smoke
fn build_scene(world: &mut World) {
    let (w, h) = (world.width() as i32, world.height() as i32);

    for y in 1..4 {
        for x in 1..w / 2 {
            world.place(x, y, Material::Stone);
        }
    }

    world.paint_circle(w / 4, h * 3 / 4, h / 6, Material::Sand);
    world.paint_circle(w / 2, h / 2, h / 8, Material::Water);

    let pool = (w * 3 / 4 - 10)..(w * 3 / 4 + 10);
    for x in pool.clone() {
        world.place(x, 1, Material::Lava);
        world.place(x, 2, Material::Lava);
    }
    for x in pool {
        world.place(x, 10, Material::Wood);
    }

    world.paint_circle(w - 12, h - 12, 6, Material::Smoke);
}

fn populations(world: &World) -> String {
    Material::ALL
        .iter()
        .filter(|m| !m.is_inert())
        .map(|&m| format!("{}={}", m.name(), world.grid().count(m)))
        .collect::<Vec<_>>()
        .join(" ")
}
