//! Tick throughput for both schedule modes

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sandfall::prelude::*;
use sandfall::world::NoopRenderSync;

const DT: f32 = 1.0 / 60.0;

/// A settled floor of sand with a small active pocket in one corner, the
/// case where skipping quiet chunks pays off
fn mostly_settled(mode: ScheduleMode) -> World {
    let config = SimConfig::default().with_schedule_mode(mode).with_seed(7);
    let mut world = World::with_config(256, 256, config).unwrap();
    for y in 1..40 {
        for x in 1..255 {
            world.place(x, y, Material::Stone);
        }
    }
    for _ in 0..120 {
        world.advance(DT);
    }
    world.paint_circle(200, 220, 12, Material::Sand);
    world.paint_circle(60, 200, 10, Material::Water);
    world
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for mode in [ScheduleMode::WholeGrid, ScheduleMode::ActiveChunks] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{mode:?}")),
            &mode,
            |b, &mode| {
                let mut world = mostly_settled(mode);
                b.iter(|| {
                    world.advance(black_box(DT));
                    world.sync_colors(&mut NoopRenderSync)
                });
            },
        );
    }
    group.finish();
}

fn bench_paint(c: &mut Criterion) {
    c.bench_function("paint_circle_r16", |b| {
        let mut world = World::new(128, 128).unwrap();
        b.iter(|| {
            world.clear_all();
            let placed = world.paint_circle(64, 64, 16, Material::Sand);
            world.sync_colors(&mut NoopRenderSync);
            black_box(placed)
        });
    });
}

criterion_group!(benches, bench_tick, bench_paint);
criterion_main!(benches);
