use gapgraph::kernels::{serial_dijkstra, verify_distances};
use gapgraph::{delta_stepping, BuildOptions, Builder, Edge, SsspOptions, WGraph, WNode, DIST_INF};
use petgraph::graph::{DiGraph, NodeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn line() -> WGraph {
    Builder::<WNode>::with_heap(BuildOptions::default())
        .build(vec![
            Edge::weighted(0, 1, 1),
            Edge::weighted(1, 2, 1),
            Edge::weighted(2, 3, 1),
        ])
        .unwrap()
}

#[test]
fn test_directed_line_delta_two() {
    let sp = delta_stepping(&line(), 0, &SsspOptions { delta: 2 }).unwrap();
    assert_eq!(sp.dist, vec![0, 1, 2, 3]);
}

#[test]
fn test_directed_line_delta_one() {
    let sp = delta_stepping(&line(), 0, &SsspOptions { delta: 1 }).unwrap();
    assert_eq!(sp.dist, vec![0, 1, 2, 3]);
}

#[test]
fn test_zero_weight_edges() {
    let g = Builder::<WNode>::with_heap(BuildOptions::default())
        .build(vec![
            Edge::weighted(0, 1, 0),
            Edge::weighted(1, 2, 0),
            Edge::weighted(2, 3, 5),
        ])
        .unwrap();
    let sp = delta_stepping(&g, 0, &SsspOptions { delta: 3 }).unwrap();
    assert_eq!(sp.dist, vec![0, 0, 0, 5]);
}

#[test]
fn test_matches_petgraph_dijkstra_for_many_deltas() {
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 2_000u32;
    let triples: Vec<(u32, u32, u32)> = (0..12_000)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n), rng.gen_range(1..100)))
        .collect();
    let g = Builder::<WNode>::with_heap(BuildOptions::default().with_num_nodes(n as usize))
        .build(triples.iter().map(|&(u, v, w)| Edge::weighted(u, v, w)).collect::<Vec<_>>())
        .unwrap();
    let mut pg = DiGraph::<(), u32>::new();
    for _ in 0..n {
        pg.add_node(());
    }
    for &(u, v, w) in &triples {
        pg.add_edge(NodeIndex::new(u as usize), NodeIndex::new(v as usize), w);
    }

    let source = triples[0].0;
    let reference = petgraph::algo::dijkstra(&pg, NodeIndex::new(source as usize), None, |e| {
        u64::from(*e.weight())
    });
    for delta in [1, 7, 32, 1_000] {
        let sp = delta_stepping(&g, source, &SsspOptions { delta }).unwrap();
        for v in g.vertices() {
            let want = reference
                .get(&NodeIndex::new(v as usize))
                .copied()
                .unwrap_or(DIST_INF);
            assert_eq!(sp.dist[v as usize], want, "delta {delta}, vertex {v}");
        }
        verify_distances(&g, &sp).unwrap();
    }
}

#[test]
fn test_undirected_weighted_thread_counts_agree() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 5_000u32;
    let edges: Vec<Edge<WNode>> = (0..30_000)
        .map(|_| Edge::weighted(rng.gen_range(0..n), rng.gen_range(0..n), rng.gen_range(1..255)))
        .collect();
    let g = Builder::<WNode>::with_heap(BuildOptions::undirected())
        .build(edges)
        .unwrap();
    let reference = serial_dijkstra(&g, 0);

    for threads in [1, 3, 8] {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        let sp = pool
            .install(|| delta_stepping(&g, 0, &SsspOptions { delta: 16 }))
            .unwrap();
        assert_eq!(sp.dist, reference, "threads {threads}");
    }
}
