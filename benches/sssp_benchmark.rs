use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gapgraph::kernels::serial_dijkstra;
use gapgraph::{delta_stepping, BuildOptions, Builder, Edge, SsspOptions, WGraph, WNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn weighted_graph(scale: u32, degree: usize) -> WGraph {
    let n = 1u32 << scale;
    let mut rng = StdRng::seed_from_u64(27_491_095);
    let edges: Vec<Edge<WNode>> = (0..n as usize * degree / 2)
        .map(|_| Edge::weighted(rng.gen_range(0..n), rng.gen_range(0..n), rng.gen_range(1..256)))
        .collect();
    Builder::with_heap(BuildOptions::undirected().with_num_nodes(n as usize))
        .build(edges)
        .unwrap()
}

fn bench_sssp(c: &mut Criterion) {
    let mut group = c.benchmark_group("sssp");
    group.sample_size(10);

    let g = weighted_graph(16, 16);
    let source = g.vertices().find(|&u| g.out_degree(u) > 0).unwrap_or(0);

    for &delta in &[1u32, 16, 64, 256] {
        group.bench_with_input(BenchmarkId::new("delta_stepping", delta), &delta, |b, &delta| {
            let options = SsspOptions { delta };
            b.iter(|| black_box(delta_stepping(&g, source, &options).unwrap()));
        });
    }

    group.bench_function("serial_dijkstra", |b| {
        b.iter(|| black_box(serial_dijkstra(&g, source)));
    });

    group.finish();
}

criterion_group!(benches, bench_sssp);
criterion_main!(benches);
