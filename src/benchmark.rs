//! Benchmarking and experimentation module.
//!
//! Runs the genetic algorithm repeatedly over consecutive seeds, collects one
//! record per run and aggregates them per instance. Runs are independent and
//! each owns its random source, so running them in parallel yields the same
//! records as running them one after another.

use crate::error::Result;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use crate::instance::TSPInstance;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Instance name
    pub instance: String,
    /// Number of cities
    pub num_cities: usize,
    /// Seed of the run
    pub seed: u64,
    /// Best distance found
    pub best_distance: f64,
    /// Generation in which the best was first reached
    pub best_generation: usize,
    /// Generations run
    pub generations: usize,
    /// Computation time in seconds
    pub time: f64,
    /// Gap to best known in percent (if available)
    pub gap_to_best: Option<f64>,
    /// Best route, labels joined with '-'
    pub route: String,
}

/// Aggregated statistics over the runs on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance: String,
    pub num_runs: usize,
    pub best_distance: f64,
    pub worst_distance: f64,
    pub mean_distance: f64,
    pub median_distance: f64,
    pub std_distance: f64,
    pub avg_best_generation: f64,
    pub avg_time: f64,
    pub total_time: f64,
    /// Seed that produced the best distance
    pub best_seed: u64,
    /// Average gap to best known (if available)
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per instance
    pub num_runs: usize,
    /// Seeds are `base_seed..base_seed + num_runs`
    pub base_seed: u64,
    /// Run the seeds in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
    /// Parameters shared by every run; the seed is overridden per run
    pub ga: GAConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 10,
            base_seed: 0,
            parallel: true,
            show_progress: true,
            output_dir: "results".to_string(),
            ga: GAConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunRecord>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    /// Set best known tour length for an instance
    pub fn set_best_known(&mut self, instance_name: &str, distance: f64) {
        self.best_known.insert(instance_name.to_string(), distance);
    }

    /// Run every seed on `instance` and record the outcomes
    pub fn run_instance(&mut self, instance: &TSPInstance) -> Result<()> {
        self.config.ga.validate()?;
        log::info!(
            "Running benchmark on instance: {} ({} runs)",
            instance.name,
            self.config.num_runs
        );

        let seeds: Vec<u64> = (0..self.config.num_runs as u64)
            .map(|i| self.config.base_seed.wrapping_add(i))
            .collect();

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(seeds.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})") {
                pb.set_style(style);
            }
            pb.set_message(instance.name.clone());
            pb
        } else {
            ProgressBar::hidden()
        };

        let run_one = |seed: u64| -> Result<RunRecord> {
            let config = self.config.ga.clone().with_seed(seed).with_verbose(false);
            let ga = GeneticAlgorithm::new(instance.clone(), config)?;

            let result = ga.run();
            progress.inc(1);

            Ok(RunRecord {
                instance: instance.name.clone(),
                num_cities: instance.num_cities(),
                seed,
                best_distance: result.best_distance,
                best_generation: result.best_generation,
                generations: result.generations(),
                time: result.elapsed,
                gap_to_best: None,
                route: result.best_route.join("-"),
            })
        };

        let records: Result<Vec<RunRecord>> = if self.config.parallel {
            seeds.par_iter().map(|&seed| run_one(seed)).collect()
        } else {
            seeds.iter().map(|&seed| run_one(seed)).collect()
        };
        progress.finish_and_clear();

        for mut record in records? {
            if let Some(&best) = self.best_known.get(&record.instance) {
                record.gap_to_best = Some((record.best_distance - best) / best * 100.0);
            }
            self.results.push(record);
        }

        Ok(())
    }

    /// Run the benchmark on several instances
    pub fn run_on_instances(&mut self, instances: &[TSPInstance]) -> Result<()> {
        for instance in instances {
            self.run_instance(instance)?;
        }
        Ok(())
    }

    /// Compute statistics for each instance, in first-run order
    pub fn compute_statistics(&self) -> Vec<InstanceSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&RunRecord>> = HashMap::new();

        for record in &self.results {
            let runs = groups.entry(record.instance.as_str()).or_default();
            if runs.is_empty() {
                order.push(record.instance.as_str());
            }
            runs.push(record);
        }

        order
            .into_iter()
            .map(|name| Self::summarize(name, &groups[name]))
            .collect()
    }

    fn summarize(name: &str, runs: &[&RunRecord]) -> InstanceSummary {
        let distances: Vec<f64> = runs.iter().map(|r| r.best_distance).collect();
        let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
        let gaps: Vec<f64> = runs.iter().filter_map(|r| r.gap_to_best).collect();

        let best_run = runs
            .iter()
            .copied()
            .fold(runs[0], |best, r| if r.best_distance < best.best_distance { r } else { best });
        let worst_distance = distances.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let std_distance = if distances.len() > 1 {
            distances.iter().std_dev()
        } else {
            0.0
        };
        let total_time: f64 = times.iter().sum();

        InstanceSummary {
            instance: name.to_string(),
            num_runs: runs.len(),
            best_distance: best_run.best_distance,
            worst_distance,
            mean_distance: distances.iter().mean(),
            median_distance: Data::new(distances.clone()).median(),
            std_distance,
            avg_best_generation: runs.iter().map(|r| r.best_generation as f64).sum::<f64>()
                / runs.len() as f64,
            avg_time: total_time / runs.len() as f64,
            total_time,
            best_seed: best_run.seed,
            avg_gap: if gaps.is_empty() {
                None
            } else {
                Some(gaps.iter().mean())
            },
        }
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        let ga = &self.config.ga;

        report.push_str("========================================\n");
        report.push_str("        TSP-GA Benchmark Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!("Generated: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        report.push_str(&format!(
            "Parameters: generations={} pop_size={} elite_size={} mutation_rate={} tournament_k={}\n",
            ga.generations, ga.pop_size, ga.elite_size, ga.mutation_rate, ga.tournament_k
        ));
        report.push_str(&format!(
            "Seeds: {}..{}\n\n",
            self.config.base_seed,
            self.config.base_seed.wrapping_add(self.config.num_runs as u64)
        ));

        report.push_str(&"-".repeat(92));
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>6} {:>12} {:>12} {:>12} {:>10} {:>8} {:>8}\n",
            "Instance", "Runs", "Best", "Mean", "Worst", "Std", "Gap%", "Time"
        ));
        report.push_str(&"-".repeat(92));
        report.push('\n');

        for stat in self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<20} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>8} {:>8.4}\n",
                stat.instance,
                stat.num_runs,
                stat.best_distance,
                stat.mean_distance,
                stat.worst_distance,
                stat.std_distance,
                gap_str,
                stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(92));
        report.push('\n');

        report.push_str("\nBest routes per instance:\n");
        for stat in self.compute_statistics() {
            if let Some(record) = self
                .results
                .iter()
                .find(|r| r.instance == stat.instance && r.seed == stat.best_seed)
            {
                report.push_str(&format!(
                    "  {}: {:.2} (seed {}) {}\n",
                    stat.instance, record.best_distance, record.seed, record.route
                ));
            }
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunRecord] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, f64> {
        &self.best_known
    }
}

/// Load `.tsp` and `.csv` instances from a directory, smallest first.
///
/// Files that fail to parse are skipped with a warning; a directory that
/// cannot be read is an error.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<TSPInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let supported = path
            .extension()
            .map(|e| e == "tsp" || e == "csv")
            .unwrap_or(false);
        if !supported {
            continue;
        }
        match TSPInstance::from_file(&path, None) {
            Ok(instance) => instances.push(instance),
            Err(e) => log::warn!("Skipping {:?}: {}", path, e),
        }
    }

    // Sort by size
    instances.sort_by_key(|i| i.num_cities());

    Ok(instances)
}
