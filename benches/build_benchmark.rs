use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gapgraph::{BuildOptions, Builder, Edge, WNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn uniform_edges(n: u32, m: usize) -> Vec<Edge> {
    let mut rng = StdRng::seed_from_u64(27_491_095);
    (0..m)
        .map(|_| Edge::new(rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for &scale in &[14u32, 17] {
        let n = 1u32 << scale;
        let edges = uniform_edges(n, (n as usize) * 16);

        group.bench_with_input(BenchmarkId::new("undirected", scale), &edges, |b, edges| {
            let builder = Builder::with_heap(BuildOptions::undirected());
            b.iter(|| black_box(builder.build(edges.clone()).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("directed_inverse", scale), &edges, |b, edges| {
            let builder = Builder::with_heap(BuildOptions::default());
            b.iter(|| black_box(builder.build(edges.clone()).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("relabel", scale), &edges, |b, edges| {
            let builder = Builder::with_heap(BuildOptions::undirected().with_relabel());
            b.iter(|| black_box(builder.build(edges.clone()).unwrap()));
        });
    }

    let weighted: Vec<Edge<WNode>> = uniform_edges(1 << 16, 1 << 20)
        .into_iter()
        .enumerate()
        .map(|(i, e)| Edge::weighted(e.u, e.v, (i % 255) as u32 + 1))
        .collect();
    group.bench_function("weighted_undirected_16", |b| {
        let builder = Builder::<WNode>::with_heap(BuildOptions::undirected());
        b.iter(|| black_box(builder.build(weighted.clone()).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
