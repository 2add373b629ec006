use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vectorgraph_core::config;
use vectorgraph_core::storage::SnapshotFile;
use vectorgraph_core::{HnswConfig, HnswGraph};

mod input;

#[derive(Parser)]
#[command(name = "vectorgraph", about = "Build and query HNSW vector snapshots")]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a graph from a file of comma-separated vectors and save a snapshot
    Build {
        /// Input file, one vector per line
        #[arg(short, long)]
        input: PathBuf,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Degree bound per layer (layer 0 uses 2*M)
        #[arg(long, default_value_t = config::HNSW_DEFAULT_M)]
        m: usize,

        /// Candidate pool size during construction
        #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_CONSTRUCTION)]
        ef_construction: usize,

        /// Default search breadth stored with the graph
        #[arg(long, default_value_t = config::HNSW_DEFAULT_EF_SEARCH)]
        ef_search: usize,

        /// Seed for level generation (reproducible builds)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Search a snapshot for the nearest neighbors of a vector
    Query {
        /// Snapshot file to read
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Query vector, e.g. "0.1,0.2,0.3"
        #[arg(short, long, allow_hyphen_values = true)]
        vector: String,

        /// Number of neighbors to return
        #[arg(short, default_value_t = 10)]
        k: usize,

        /// Search breadth (defaults to the snapshot's ef_search)
        #[arg(long)]
        ef: Option<usize>,
    },
    /// Print summary statistics for a snapshot
    Stats {
        /// Snapshot file to read
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vectorgraph_core=info,vectorgraph=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_json);

    match args.command {
        Command::Build {
            input,
            output,
            m,
            ef_construction,
            ef_search,
            seed,
        } => {
            let vectors = input::read_vectors(&input)?;
            let Some(dimension) = vectors.first().map(Vec::len) else {
                return Err(format!("{} contains no vectors", input.display()).into());
            };
            let mut hnsw_config = HnswConfig {
                ef_construction,
                ef_search,
                ..HnswConfig::with_m(m)
            };
            hnsw_config.seed = seed;

            let output = if output.extension().is_none() {
                output.with_extension(config::SNAPSHOT_EXTENSION)
            } else {
                output
            };

            let mut graph = HnswGraph::new(dimension, hnsw_config)?;
            let t0 = Instant::now();
            graph.insert_batch(vectors)?;
            tracing::info!(
                nodes = graph.len(),
                dimension,
                max_layer = graph.max_layer(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "graph built"
            );
            graph.save(&output)?;
        }
        Command::Query {
            snapshot,
            vector,
            k,
            ef,
        } => {
            if k > config::MAX_K {
                return Err(format!("k must be at most {}", config::MAX_K).into());
            }
            let query = input::parse_vector(&vector)?;
            let graph = HnswGraph::load(&snapshot)?;
            let ef = ef.unwrap_or(graph.config().ef_search);
            let t0 = Instant::now();
            let hits = graph.search(&query, k, ef)?;
            tracing::debug!(hits = hits.len(), elapsed_us = t0.elapsed().as_micros() as u64, "search done");
            for hit in hits {
                println!("{}\t{:.6}", hit.id, hit.distance);
            }
        }
        Command::Stats { snapshot } => {
            let file = SnapshotFile::open(&snapshot)?;
            let header = file.header().clone();
            let graph = HnswGraph::rehydrate(&file)?;
            println!("nodes:        {}", header.node_count);
            println!("dimension:    {}", header.dimension);
            println!("max layer:    {}", header.max_layer);
            match header.entry_point {
                Some(ep) => println!("entry point:  {ep}"),
                None => println!("entry point:  -"),
            }
            println!("M / M0:       {} / {}", header.config.m, header.config.m_max0);
            for layer in 0..=graph.max_layer() {
                println!("mean degree L{layer}: {:.2}", graph.mean_degree(layer));
            }
        }
    }
    Ok(())
}
