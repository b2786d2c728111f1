//! # Pool Hot Path Benchmark
//!
//! The per-tick cost that matters: adding a wave of generated deltas
//! to a pool, rating it, and draining the priority queue.
//!
//! Run with: `cargo bench --package arbiter_replication`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use arbiter_replication::{
    Delta, DeltaKind, DeltaPayload, ObjectFlags, Pool, RegisteredObject, ReplicationConfig,
};
use arbiter_world::{GameObject, ObjectId, World};
use bytemuck::Zeroable;

/// Objects per simulated wave.
const WAVE: u32 = 2000;

fn object_delta(id: u32) -> Delta {
    let mut payload = RegisteredObject::zeroed();
    payload.id = ObjectId(id);
    payload.origin = [f64::from(id % 97) * 16.0, f64::from(id % 53) * 16.0, 0.0];
    payload.radius = 20.0;
    payload.height = 56.0;
    let mut delta = Delta::new(DeltaKind::Object, id, 0, DeltaPayload::Object(payload));
    delta.flags = ObjectFlags::ORIGIN_X | ObjectFlags::ORIGIN_Y | ObjectFlags::MOM_X;
    delta
}

fn bench_add_wave(c: &mut Criterion) {
    let world = World::new();
    let config = ReplicationConfig::default();

    c.bench_function("pool_add_2000_deltas", |b| {
        b.iter(|| {
            let mut pool = Pool::new(0);
            for id in 1..=WAVE {
                pool.add_delta(black_box(&object_delta(id)), &world, &config);
            }
            pool.len()
        });
    });
}

fn bench_add_merge_heavy(c: &mut Criterion) {
    let world = World::new();
    let config = ReplicationConfig::default();

    // Every delta collides with an existing NEW entry.
    c.bench_function("pool_add_2000_merges", |b| {
        b.iter(|| {
            let mut pool = Pool::new(0);
            for id in 1..=WAVE {
                pool.add_delta(&object_delta(id), &world, &config);
            }
            for id in 1..=WAVE {
                pool.add_delta(black_box(&object_delta(id)), &world, &config);
            }
            pool.len()
        });
    });
}

fn bench_rate_and_drain(c: &mut Criterion) {
    let mut world = World::new();
    let viewer = world.objects.spawn(GameObject::default());
    world.join_player(0, viewer);
    let config = ReplicationConfig::default();
    let scores = arbiter_replication::rate::base_scores();

    c.bench_function("pool_rate_and_drain_2000", |b| {
        b.iter_batched(
            || {
                let mut pool = Pool::new(0);
                for id in 1..=WAVE {
                    pool.add_delta(&object_delta(id), &world, &config);
                }
                pool
            },
            |mut pool| {
                pool.rate(&world, &config, &scores, 1000);
                let mut drained = 0;
                while let Some(handle) = pool.queue_extract() {
                    black_box(pool.delta(handle));
                    drained += 1;
                }
                drained
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_add_wave,
    bench_add_merge_heavy,
    bench_rate_and_drain
);
criterion_main!(benches);
