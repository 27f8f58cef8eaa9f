use std::sync::atomic::{AtomicU64, Ordering};

use gapgraph::concurrency::{fetch_min_strict, DisjointWriter};
use gapgraph::{Bitmap, PVec, QueueBuffer, SlidingQueue};
use rayon::prelude::*;

#[test]
fn test_sliding_queue_rounds() {
    let mut queue = SlidingQueue::with_capacity(3_000);
    queue.push_back(0u32);
    queue.slide_window();

    // Each round pushes the successors of the current window.
    for round in 0..3u32 {
        let window: Vec<u32> = queue.window().to_vec();
        window.par_iter().for_each_init(
            || QueueBuffer::with_limit(&queue, 8),
            |buf, &u| {
                for k in 0..10 {
                    buf.push(u * 10 + k + 1);
                }
            },
        );
        assert_eq!(queue.window(), &window[..], "round {round} window changed early");
        queue.slide_window();
        assert_eq!(queue.len(), window.len() * 10);
    }
}

#[test]
fn test_bitmap_concurrent_test_and_set_single_winner() {
    let bm = Bitmap::new(1_000);
    let winners: usize = (0..8_000usize)
        .into_par_iter()
        .filter(|i| bm.test_and_set(i % 1_000))
        .count();
    assert_eq!(winners, 1_000);
    assert_eq!(bm.count_ones(), 1_000);
    bm.reset();
    assert_eq!(bm.count_ones(), 0);
}

#[test]
fn test_fetch_min_converges_to_minimum() {
    let slot = AtomicU64::new(u64::MAX);
    let successes: usize = (0..10_000usize)
        .into_par_iter()
        .rev()
        .filter(|&c| fetch_min_strict(&slot, c as u64 + 5))
        .count();
    assert!(successes >= 1);
    assert_eq!(slot.load(Ordering::Relaxed), 5);
}

#[test]
fn test_pvec_parallel_fill_and_uninit_growth() {
    let mut v = PVec::filled(100_000, 7u32);
    assert!(v.iter().all(|&x| x == 7));
    v.fill(9);
    assert!(v.par_iter().all(|&x| x == 9));

    // SAFETY: every slot is written below before it is read.
    let mut w = unsafe { PVec::<u64>::uninit(50_000) };
    {
        let writer = DisjointWriter::new(&mut w);
        (0..50_000usize).into_par_iter().for_each(|i| {
            // SAFETY: each index is written by exactly one iteration.
            unsafe { writer.write(i, i as u64 * 2) };
        });
    }
    assert_eq!(w[49_999], 99_998);
    let collected: PVec<u64> = (0..10u64).into_par_iter().collect();
    assert_eq!(&collected[..], &(0..10).collect::<Vec<_>>()[..]);
}
