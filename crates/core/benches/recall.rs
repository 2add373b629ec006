//! ANN Benchmark: uniform random vectors, Euclidean distance.
//! Measures Recall@10 and QPS against brute-force ground truth.
//!
//! Usage: cargo bench --bench recall

use std::collections::HashSet;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vectorgraph_core::hnsw::exact_search;
use vectorgraph_core::{HnswConfig, HnswGraph, NodeId};

const TRAIN_COUNT: usize = 20_000;
const QUERY_COUNT: usize = 500;
const DIM: usize = 32;
const K: usize = 10;

fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

/// Compute Recall@k: fraction of true nearest neighbors found
fn recall_at_k(predicted: &[NodeId], ground_truth: &[NodeId], k: usize) -> f64 {
    let gt_set: HashSet<NodeId> = ground_truth.iter().take(k).copied().collect();
    let found = predicted
        .iter()
        .take(k)
        .filter(|id| gt_set.contains(id))
        .count();
    found as f64 / k as f64
}

fn main() {
    println!("=== ANN Benchmark: random-{DIM} euclidean ===");
    println!();

    let train_vectors = random_vectors(TRAIN_COUNT, DIM, 1);
    let test_vectors = random_vectors(QUERY_COUNT, DIM, 2);

    let configs = vec![
        ("M=8, ef_c=100", HnswConfig { ef_construction: 100, ..HnswConfig::with_m(8) }),
        ("M=16, ef_c=200", HnswConfig::default()),
    ];

    for (label, config) in configs {
        println!();
        println!("Config: {label}");

        let mut graph = HnswGraph::new(DIM, config.seeded(7)).expect("valid config");

        let t0 = Instant::now();
        for (i, v) in train_vectors.iter().enumerate() {
            graph.insert(v.clone()).expect("matching dimension");
            if (i + 1) % 5_000 == 0 {
                let rate = (i + 1) as f64 / t0.elapsed().as_secs_f64();
                println!("  inserted {}/{TRAIN_COUNT} ({rate:.0} vec/s)", i + 1);
            }
        }
        let build_time = t0.elapsed();
        println!(
            "  Build time: {:.2}s ({:.0} inserts/s), max layer {}, mean degree L0 {:.1}",
            build_time.as_secs_f64(),
            TRAIN_COUNT as f64 / build_time.as_secs_f64(),
            graph.max_layer(),
            graph.mean_degree(0)
        );

        print!("  Computing ground truth...");
        let ground_truth: Vec<Vec<NodeId>> = test_vectors
            .iter()
            .map(|q| {
                exact_search(&graph, q, K)
                    .expect("matching dimension")
                    .iter()
                    .map(|n| n.id)
                    .collect()
            })
            .collect();
        println!(" done");

        println!();
        println!("  ef_search | Recall@10 |    QPS    | Avg latency");
        println!("  ----------+-----------+-----------+------------");

        for ef in [10, 20, 40, 80, 160] {
            // Warm up (10 queries)
            for q in test_vectors.iter().take(10) {
                let _ = graph.search(q, K, ef);
            }

            let t0 = Instant::now();
            let mut total_recall = 0.0f64;
            for (qi, q) in test_vectors.iter().enumerate() {
                let predicted: Vec<NodeId> = graph
                    .search(q, K, ef)
                    .expect("matching dimension")
                    .iter()
                    .map(|n| n.id)
                    .collect();
                total_recall += recall_at_k(&predicted, &ground_truth[qi], K);
            }
            let elapsed = t0.elapsed();

            let avg_recall = total_recall / QUERY_COUNT as f64;
            let qps = QUERY_COUNT as f64 / elapsed.as_secs_f64();
            let avg_latency_us = elapsed.as_micros() as f64 / QUERY_COUNT as f64;
            println!(
                "  {:>9} | {:.4}    | {:>9.1} | {:.0} us",
                ef, avg_recall, qps, avg_latency_us
            );
        }
    }

    println!();
    println!("=== Benchmark complete ===");
}
