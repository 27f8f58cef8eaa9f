use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gapgraph::{direction_optimizing_bfs, top_down_bfs, BfsOptions, BuildOptions, Builder, Edge, Graph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn uniform_graph(scale: u32, degree: usize) -> Graph {
    let n = 1u32 << scale;
    let mut rng = StdRng::seed_from_u64(27_491_095);
    let edges: Vec<Edge> = (0..n as usize * degree / 2)
        .map(|_| Edge::new(rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    Builder::with_heap(BuildOptions::undirected().with_num_nodes(n as usize))
        .build(edges)
        .unwrap()
}

fn bench_bfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("bfs");
    group.sample_size(20);

    for &scale in &[16u32, 18] {
        let g = uniform_graph(scale, 16);
        let source = g.vertices().find(|&u| g.out_degree(u) > 0).unwrap_or(0);

        group.bench_with_input(BenchmarkId::new("direction_optimizing", scale), &g, |b, g| {
            let options = BfsOptions::default();
            b.iter(|| black_box(direction_optimizing_bfs(g, source, &options).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("top_down", scale), &g, |b, g| {
            b.iter(|| black_box(top_down_bfs(g, source).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bfs);
criterion_main!(benches);
