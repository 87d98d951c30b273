use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rangebench::{Dynamic, Measurement, NumberValues, Profiler, StringValues, ValueSource};
use ranged_index::{ComparatorRegistry, IndexRegistry, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Number,
    String,
    All,
}

/// Time insert, update, remove and lookup throughput of a ranged index.
#[derive(Parser, Debug)]
#[command(name = "rangebench", version)]
struct Args {
    /// Documents per profile
    #[arg(short = 'n', long, default_value_t = 100_000)]
    count: usize,

    /// Value kind to profile
    #[arg(short, long, value_enum, default_value_t = Kind::All)]
    kind: Kind,

    /// Comparator name; `natural` compares native values, anything else is
    /// looked up among the mixed-type comparators
    #[arg(short, long, default_value = "natural")]
    comparator: String,

    /// Index algorithm name
    #[arg(short, long, default_value = "avl")]
    algorithm: String,

    /// RNG seed, for repeatable string values and shuffles
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("rangebench: error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!(?args, "starting");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if matches!(args.kind, Kind::Number | Kind::All) {
        report(profile(&args, NumberValues, &mut rng).context("number profiles")?);
    }
    if matches!(args.kind, Kind::String | Kind::All) {
        report(profile(&args, StringValues, &mut rng).context("string profiles")?);
    }
    Ok(())
}

/// Run every profile for `source`, natively or through [`Value`] depending on
/// the selected comparator.
fn profile<S>(args: &Args, source: S, rng: &mut StdRng) -> Result<Vec<Measurement>>
where
    S: ValueSource,
    S::Value: Ord + Into<Value> + 'static,
{
    let rng = StdRng::from_rng(rng).context("seeding profile rng")?;
    if args.comparator == "natural" {
        let comparator = ComparatorRegistry::<S::Value>::natural().get("natural")?;
        Profiler::new(
            source,
            IndexRegistry::with_defaults(),
            args.algorithm.as_str(),
            comparator,
            rng,
        )
        .run_all(args.count)
    } else {
        let comparator = ComparatorRegistry::<Value>::with_defaults().get(&args.comparator)?;
        Profiler::new(
            Dynamic(source),
            IndexRegistry::with_defaults(),
            args.algorithm.as_str(),
            comparator,
            rng,
        )
        .run_all(args.count)
    }
}

fn report(measurements: Vec<Measurement>) {
    for m in measurements {
        println!("{m}");
    }
}
