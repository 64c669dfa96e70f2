mod dataset;

use bucketq::{PriorityQueue, Queue, Reclamation, SequencedHeap};
use clap::{Parser, ValueEnum};
use dataset::{CheckError, Dataset};
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QueueType {
    Eager,
    Lazy,
    Sequenced,
    All,
}

impl QueueType {
    fn expand(self) -> Vec<QueueType> {
        match self {
            QueueType::All => vec![QueueType::Eager, QueueType::Lazy, QueueType::Sequenced],
            other => vec![other],
        }
    }

    fn build(self) -> Box<dyn Queue<i64, String>> {
        match self {
            QueueType::Eager => Box::new(PriorityQueue::with_policy(Reclamation::Eager)),
            QueueType::Lazy => Box::new(PriorityQueue::with_policy(Reclamation::Lazy)),
            QueueType::Sequenced | QueueType::All => Box::new(SequencedHeap::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Verify pop order on the fixed and random datasets
    Check,
    /// Time push-all / drain-all rounds on the random dataset
    Bench,
}

struct RunOpts {
    rounds: usize,
    compact: bool,
}

struct QueueStats {
    name: String,
    timings_ms: Vec<f64>,
}

/// Push the whole dataset, then drain it, timing both. Returns the drained
/// values and the elapsed milliseconds.
fn run_round(queue_type: QueueType, dataset: &Dataset, compact: bool) -> (Vec<String>, f64) {
    let mut queue = queue_type.build();
    let start = Instant::now();
    dataset.load(&mut *queue);
    if compact {
        queue.compact();
    }
    let popped = dataset::drain(&mut *queue);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    (popped, elapsed_ms)
}

fn bench_queue(
    queue_type: QueueType,
    dataset: &Dataset,
    opts: &RunOpts,
) -> Result<QueueStats, CheckError> {
    let name = queue_type.build().name();
    let mut timings_ms = Vec::with_capacity(opts.rounds);
    for round in 0..opts.rounds {
        let (popped, elapsed_ms) = run_round(queue_type, dataset, opts.compact);
        debug!("{}: round {} took {:.3} ms", name, round + 1, elapsed_ms);
        dataset::verify_random(&popped, dataset.len())?;
        timings_ms.push(elapsed_ms);
    }

    let best = timings_ms.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = timings_ms.iter().sum::<f64>() / timings_ms.len() as f64;
    println!(
        "queue: {:<10}  values: {:<8}  rounds: {:<3}  best: {:>9.3} ms  mean: {:>9.3} ms",
        name,
        dataset.len(),
        opts.rounds,
        best,
        mean
    );

    Ok(QueueStats { name, timings_ms })
}

fn check_queue(
    queue_type: QueueType,
    scenario: &Dataset,
    random: &Dataset,
    opts: &RunOpts,
) -> Result<(), CheckError> {
    let (popped, _) = run_round(queue_type, scenario, opts.compact);
    dataset::verify_scenario(&popped)?;

    let (popped, _) = run_round(queue_type, random, opts.compact);
    dataset::verify_random(&popped, random.len())?;

    println!(
        "queue: {:<10}  scenario: ok  random: ok ({} values)",
        queue_type.build().name(),
        random.len()
    );
    Ok(())
}

fn append_timings(path: &str, stats: &[QueueStats]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for entry in stats {
        let timings: Vec<String> = entry
            .timings_ms
            .iter()
            .map(|ms| format!("{:.3}", ms))
            .collect();
        writeln!(file, "{}: [{}]", entry.name, timings.join(", "))?;
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "bucketq")]
#[command(about = "Check and time priority queue implementations", long_about = None)]
struct Args {
    /// What to run
    #[arg(value_enum, default_value = "bench")]
    mode: Mode,

    /// Queue implementation to run
    #[arg(short, long, value_enum, default_value = "all")]
    queue: QueueType,

    /// Number of values in the random dataset
    #[arg(short = 'n', long, default_value = "4096")]
    size: usize,

    /// Lowest priority in the random dataset
    #[arg(long, default_value = "-4", allow_negative_numbers = true)]
    min_priority: i64,

    /// Highest priority in the random dataset
    #[arg(long, default_value = "3", allow_negative_numbers = true)]
    max_priority: i64,

    /// Bytes of padding in front of every value
    #[arg(short, long, default_value = "1024")]
    payload: usize,

    /// Number of timed rounds per queue
    #[arg(short, long, default_value = "3")]
    rounds: usize,

    /// Seed for the random dataset
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Call compact between loading and draining
    #[arg(long, default_value = "false")]
    compact: bool,

    /// Append per-round timings to this file
    #[arg(short, long, value_name = "FILE")]
    log: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.min_priority > args.max_priority {
        eprintln!("Error: min priority must be <= max priority");
        std::process::exit(1);
    }

    if args.size == 0 {
        eprintln!("Error: dataset size must be at least 1");
        std::process::exit(1);
    }

    if args.rounds == 0 {
        eprintln!("Error: rounds must be at least 1");
        std::process::exit(1);
    }

    let payload = "a".repeat(args.payload);
    let random = Dataset::random(
        args.size,
        args.min_priority,
        args.max_priority,
        &payload,
        args.seed,
    );
    info!(
        "dataset: {} values, priorities {}..={}, seed {}",
        random.len(),
        args.min_priority,
        args.max_priority,
        args.seed
    );

    let opts = RunOpts {
        rounds: args.rounds,
        compact: args.compact,
    };

    let mut failed = false;
    let mut stats = Vec::new();
    for queue_type in args.queue.expand() {
        let result = match args.mode {
            Mode::Check => {
                let scenario = Dataset::scenario(&payload);
                check_queue(queue_type, &scenario, &random, &opts)
            }
            Mode::Bench => bench_queue(queue_type, &random, &opts).map(|s| stats.push(s)),
        };
        if let Err(e) = result {
            eprintln!("Error: {:?} queue failed: {}", queue_type, e);
            failed = true;
        }
    }

    if let Some(ref path) = args.log {
        if let Err(e) = append_timings(path, &stats) {
            eprintln!("Error writing timings to {}: {}", path, e);
            std::process::exit(1);
        }
    }

    if failed {
        std::process::exit(1);
    }
}
