//! TSP-GA Solver - Command Line Interface
//!
//! Solves the fixed-start Traveling Salesman Problem with a genetic algorithm.

use clap::{Args, Parser, Subcommand};
use tsp_ga_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use tsp_ga_solver::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use tsp_ga_solver::instance::TSPInstance;
use tsp_ga_solver::SolverError;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tsp-ga-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm solver for the fixed-start TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Genetic algorithm parameters
#[derive(Args, Debug, Clone)]
struct GaArgs {
    /// Number of generations
    #[arg(short, long, default_value = "800")]
    generations: usize,

    /// Population size
    #[arg(short, long, default_value = "300")]
    pop_size: usize,

    /// Individuals carried over unchanged each generation
    #[arg(short, long, default_value = "8")]
    elite_size: usize,

    /// Per-position swap mutation probability
    #[arg(short, long, default_value = "0.03")]
    mutation_rate: f64,

    /// Tournament size
    #[arg(short = 'k', long, default_value = "7")]
    tournament_k: usize,
}

impl GaArgs {
    fn to_config(&self) -> GAConfig {
        GAConfig::default()
            .with_generations(self.generations)
            .with_pop_size(self.pop_size)
            .with_elite_size(self.elite_size)
            .with_mutation_rate(self.mutation_rate)
            .with_tournament_k(self.tournament_k)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance
    Solve {
        /// Instance file (.tsp or .csv); the built-in ten-city layout if omitted
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Label of the start city (defaults to the first city)
        #[arg(long)]
        start: Option<String>,

        #[command(flatten)]
        ga: GaArgs,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: Option<u64>,

        /// Draw the seed from entropy instead
        #[arg(long, conflicts_with = "seed")]
        random_seed: bool,

        /// Progress report cadence in generations
        #[arg(long)]
        report_every: Option<usize>,

        /// Output result to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the convergence history to a CSV file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run repeated seeded runs and aggregate the results
    Benchmark {
        /// Instance file; the built-in ten-city layout if neither this nor --dir is given
        #[arg(short, long, conflicts_with = "dir")]
        instance: Option<PathBuf>,

        /// Directory of .tsp/.csv instances
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per instance
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// First seed; runs use consecutive seeds
        #[arg(long, default_value = "0")]
        base_seed: u64,

        /// Run seeds one after another
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        ga: GaArgs,
    },

    /// Analyze an instance
    Analyze {
        /// Instance file (.tsp or .csv); the built-in ten-city layout if omitted
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Label of the start city (defaults to the first city)
        #[arg(long)]
        start: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { instance, start, ga, seed, random_seed, report_every, output, history, verbose } => {
            let seed = resolve_seed(seed, random_seed);
            solve_instance(instance.as_deref(), start.as_deref(), &ga, seed, report_every, output, history, verbose)
        }

        Commands::Benchmark { instance, dir, output, runs, base_seed, sequential, ga } => {
            run_benchmark(instance.as_deref(), dir.as_deref(), &output, runs, base_seed, !sequential, &ga)
        }

        Commands::Analyze { instance, start } => analyze_instance(instance.as_deref(), start.as_deref()),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `--random-seed` overrides the default seed
fn resolve_seed(seed: Option<u64>, random_seed: bool) -> Option<u64> {
    if random_seed {
        None
    } else {
        seed
    }
}

fn load_instance(path: Option<&Path>, start: Option<&str>) -> Result<TSPInstance, SolverError> {
    match path {
        Some(path) => {
            println!("Loading instance from {:?}...", path);
            TSPInstance::from_file(path, start)
        }
        None => {
            let instance = TSPInstance::ten_cities();
            match start {
                Some(label) => TSPInstance::new(instance.name.clone(), instance.cities().to_vec(), label),
                None => Ok(instance),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: Option<&Path>,
    start: Option<&str>,
    ga: &GaArgs,
    seed: Option<u64>,
    report_every: Option<usize>,
    output: Option<PathBuf>,
    history: Option<PathBuf>,
    verbose: bool,
) -> Result<(), SolverError> {
    let instance = load_instance(path, start)?;

    if verbose {
        println!("{}", instance.statistics());
    }

    let mut config = ga.to_config();
    config.seed = seed;
    config.report_every = report_every;

    let ga = GeneticAlgorithm::new(instance, config)?;
    println!(
        "Solving {} ({} cities) with seed {}...",
        ga.instance().name,
        ga.instance().num_cities(),
        ga.seed()
    );

    let result = ga.run();

    println!("\n========== Results ==========");
    println!("{}", result);

    if verbose {
        println!("\nHistory (every generation best):");
        for (gen, dist) in result.history.iter().enumerate() {
            println!("  {:4} {:.2}", gen + 1, dist);
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json)?;
        println!("\nResult saved to {:?}", out_path);
    }

    if let Some(history_path) = history {
        result.export_history_csv(&history_path)?;
        println!("History saved to {:?}", history_path);
    }

    Ok(())
}

fn run_benchmark(
    instance: Option<&Path>,
    dir: Option<&Path>,
    output: &Path,
    runs: usize,
    base_seed: u64,
    parallel: bool,
    ga: &GaArgs,
) -> Result<(), SolverError> {
    let instances = match dir {
        Some(dir) => {
            println!("Loading instances from {:?}...", dir);
            load_instances_from_dir(dir)?
        }
        None => vec![load_instance(instance, None)?],
    };

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        return Err(SolverError::NoInstances(dir.map(Path::to_path_buf).unwrap_or_default()));
    }

    std::fs::create_dir_all(output)?;

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed,
        parallel,
        output_dir: output.to_string_lossy().to_string(),
        ga: ga.to_config().with_verbose(false),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing {} (n={})...",
            i + 1,
            instances.len(),
            instance.name,
            instance.num_cities()
        );

        benchmark.run_instance(instance)?;
    }

    let results_path = output.join("runs.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("summary.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(path: Option<&Path>, start: Option<&str>) -> Result<(), SolverError> {
    let instance = load_instance(path, start)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    println!("\nCities:");
    for (i, city) in instance.cities().iter().enumerate() {
        let marker = if i == instance.start() { " (start)" } else { "" };
        println!("  {:<8} ({:>10.2}, {:>10.2}){}", city.label, city.x, city.y, marker);
    }

    let identity = instance.closed_route(&instance.identity_tour());
    println!(
        "\nIdentity-order route: {}",
        instance.route_labels(&identity).join(" -> ")
    );
    println!("  Length: {:.2}", instance.tour_length(&identity));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn solve_args(args: &[&str]) -> (GaArgs, Option<u64>) {
        let argv = ["tsp-ga-solver", "solve"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Solve { ga, seed, random_seed, .. } => (ga, resolve_seed(seed, random_seed)),
            _ => panic!("expected the solve command"),
        }
    }

    #[test]
    fn test_solve_defaults_to_seed_42() {
        let (ga, seed) = solve_args(&[]);
        assert_eq!(seed, Some(42));
        assert_eq!(ga.generations, 800);
        assert_eq!(ga.pop_size, 300);
        assert_eq!(ga.elite_size, 8);
        assert_eq!(ga.tournament_k, 7);
    }

    #[test]
    fn test_random_seed_overrides_default() {
        let (_, seed) = solve_args(&["--random-seed"]);
        assert_eq!(seed, None);

        let (_, seed) = solve_args(&["--seed", "1"]);
        assert_eq!(seed, Some(1));
    }

    #[test]
    fn test_seed_conflicts_with_random_seed() {
        let err = Cli::try_parse_from(["tsp-ga-solver", "solve", "--seed", "1", "--random-seed"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_benchmark_instance_conflicts_with_dir() {
        let err = Cli::try_parse_from(["tsp-ga-solver", "benchmark", "--instance", "a.tsp", "--dir", "d"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_reported_seed_replays_random_run() {
        let (ga, seed) = solve_args(&["--random-seed", "-g", "40", "-p", "30", "-e", "2", "-k", "3"]);
        let mut config = ga.to_config().with_verbose(false);
        config.seed = seed;

        let solver = GeneticAlgorithm::new(TSPInstance::ten_cities(), config).unwrap();
        let reported = solver.seed().to_string();
        let first = solver.run();

        let (ga, seed) = solve_args(&["--seed", &reported, "-g", "40", "-p", "30", "-e", "2", "-k", "3"]);
        let mut config = ga.to_config().with_verbose(false);
        config.seed = seed;
        let replay = GeneticAlgorithm::new(TSPInstance::ten_cities(), config).unwrap().run();

        assert_eq!(first, replay);
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = std::env::temp_dir().join(format!("tsp-ga-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("out");

        let (ga, _) = solve_args(&[]);
        let result = run_benchmark(None, Some(&dir), &out, 1, 0, false, &ga);
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(SolverError::NoInstances(_))));
    }
}
