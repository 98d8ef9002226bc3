use breakroom_core::{pack, BlockFootprint, Dashboard, GridRect, SavedPositions};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sample_blocks(count: usize) -> Vec<BlockFootprint> {
    (0..count)
        .map(|i| {
            let i = i as u32;
            BlockFootprint::new(i as i64, (i * 2) % 5, i / 3, 1 + i % 3, 1 + i % 4)
        })
        .collect()
}

fn bench_pack_unsaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_unsaved");
    for count in [8usize, 32, 64] {
        let blocks = sample_blocks(count);
        let saved = SavedPositions::new();
        group.bench_with_input(BenchmarkId::from_parameter(count), &blocks, |b, blocks| {
            b.iter(|| black_box(pack(blocks, &saved, 5).unwrap()));
        });
    }
    group.finish();
}

fn bench_pack_half_saved(c: &mut Criterion) {
    let blocks = sample_blocks(32);
    let saved: SavedPositions = blocks
        .iter()
        .step_by(2)
        .enumerate()
        .map(|(row, b)| (b.id, 4, GridRect::new(0, row as u32, 2, 1)))
        .collect();

    c.bench_function("pack_half_saved_32", |b| {
        b.iter(|| black_box(pack(&blocks, &saved, 4).unwrap()));
    });
}

fn bench_responsive(c: &mut Criterion) {
    let dashboard = Dashboard::new(sample_blocks(32), SavedPositions::new());

    c.bench_function("responsive_layouts_32", |b| {
        b.iter(|| black_box(dashboard.responsive_layouts().unwrap()));
    });
}

criterion_group!(benches, bench_pack_unsaved, bench_pack_half_saved, bench_responsive);
criterion_main!(benches);
