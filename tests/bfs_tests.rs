use gapgraph::kernels::{serial_bfs_depths, verify_bfs_tree};
use gapgraph::{
    direction_optimizing_bfs, top_down_bfs, BfsOptions, BuildOptions, Builder, CsrGraph, Edge,
    NodeId,
};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_graph(n: u32, m: usize, seed: u64) -> (Vec<(u32, u32)>, CsrGraph) {
    let mut rng = StdRng::seed_from_u64(seed);
    let pairs: Vec<(u32, u32)> = (0..m)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    let edges: Vec<Edge> = pairs.iter().map(|&(u, v)| Edge::new(u, v)).collect();
    let g = Builder::with_heap(BuildOptions::undirected().with_num_nodes(n as usize))
        .build(edges)
        .unwrap();
    (pairs, g)
}

#[test]
fn test_five_cycle_from_zero() {
    let edges: Vec<Edge> = (0..5).map(|u| Edge::new(u, (u + 1) % 5)).collect();
    let g = Builder::with_heap(BuildOptions::undirected()).build(edges).unwrap();

    let tree = direction_optimizing_bfs(&g, 0, &BfsOptions::default()).unwrap();
    assert_eq!(tree.reached_count(), 5);
    assert_eq!(tree.parent_of(0), Some(0));
    let depths = tree.depths();
    assert!(depths.iter().all(|d| matches!(d, Some(x) if *x <= 2)));
    verify_bfs_tree(&g, &tree).unwrap();
}

#[test]
fn test_depths_identical_across_thread_counts() {
    let (_, g) = random_graph(20_000, 120_000, 11);
    let source: NodeId = g.vertices().find(|&u| g.out_degree(u) > 0).unwrap();

    let depths: Vec<Vec<Option<u32>>> = [1, 2, 4, 8]
        .iter()
        .map(|&threads| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let tree = pool
                .install(|| direction_optimizing_bfs(&g, source, &BfsOptions::default()))
                .unwrap();
            verify_bfs_tree(&g, &tree).unwrap();
            tree.depths()
        })
        .collect();
    for d in &depths[1..] {
        assert_eq!(d, &depths[0]);
    }
}

#[test]
fn test_matches_petgraph_unit_dijkstra() {
    let (pairs, g) = random_graph(3_000, 9_000, 5);
    let pg = UnGraph::<(), ()>::from_edges(pairs.iter().copied());
    let source = pairs[0].0;

    let reference = petgraph::algo::dijkstra(&pg, NodeIndex::new(source as usize), None, |_| 1u32);
    let tree = direction_optimizing_bfs(&g, source, &BfsOptions::default()).unwrap();
    let depths = tree.depths();
    for v in g.vertices() {
        let want = reference.get(&NodeIndex::new(v as usize)).copied();
        assert_eq!(depths[v as usize], want, "depth of {v}");
    }
}

#[test]
fn test_directed_graph_uses_in_edges_for_bottom_up() {
    // Directed star out of 0 followed by a chain; force bottom-up.
    let mut edges: Vec<Edge> = (1..200).map(|v| Edge::new(0, v)).collect();
    edges.extend((1..199).map(|v| Edge::new(v, v + 1)));
    edges.push(Edge::new(250, 0));
    let g = Builder::with_heap(BuildOptions::default()).build(edges).unwrap();

    let options = BfsOptions { alpha: 1 << 20, beta: 1 };
    let tree = direction_optimizing_bfs(&g, 0, &options).unwrap();
    verify_bfs_tree(&g, &tree).unwrap();
    // 250 only has an out-edge into the component.
    assert_eq!(tree.parent_of(250), None);
    assert_eq!(tree.depths(), serial_bfs_depths(&g, 0));
}

#[test]
fn test_top_down_and_direction_optimizing_agree() {
    let (_, g) = random_graph(10_000, 80_000, 99);
    for source in [0, 17, 4_242] {
        if g.out_degree(source) == 0 {
            continue;
        }
        let a = direction_optimizing_bfs(&g, source, &BfsOptions::default()).unwrap();
        let b = top_down_bfs(&g, source).unwrap();
        assert_eq!(a.depths(), b.depths());
        assert_eq!(a.reached_count(), b.reached_count());
    }
}
