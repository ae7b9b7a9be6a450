//! Result of a genetic algorithm run.
//!
//! A [`RunResult`] is produced once at the end of a run and never modified
//! afterwards. It carries the best closed route, its length and the per
//! generation best-fitness history used for convergence inspection.
//! Wall-clock time is recorded but is not part of equality, so two runs with
//! the same seed compare equal.

use crate::instance::TSPInstance;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Best closed route as city labels, start city at both ends
    pub best_route: Vec<String>,
    /// Length of the best route
    pub best_distance: f64,
    /// Best fitness of each generation, in order
    pub history: Vec<f64>,
    /// Generation (1-based) in which the best route was first seen
    pub best_generation: usize,
    /// Number of generations run
    pub generations: usize,
    /// Seed that drove the random source; drawn from entropy when none was configured
    pub seed: u64,
    /// Wall-clock duration of the run in seconds
    pub elapsed: f64,
}

impl PartialEq for RunResult {
    fn eq(&self, other: &Self) -> bool {
        self.best_route == other.best_route
            && self.best_distance == other.best_distance
            && self.history == other.history
            && self.best_generation == other.best_generation
            && self.generations == other.generations
            && self.seed == other.seed
    }
}

impl RunResult {
    /// Build a result from a best tour expressed as city indices (without start)
    pub(crate) fn from_tour(
        instance: &TSPInstance,
        tour: &[usize],
        best_distance: f64,
        history: Vec<f64>,
        best_generation: usize,
        seed: u64,
        elapsed: f64,
    ) -> Self {
        let route = instance.closed_route(tour);
        RunResult {
            best_route: instance.route_labels(&route),
            best_distance,
            generations: history.len(),
            history,
            best_generation,
            seed,
            elapsed,
        }
    }

    /// Number of generations that were run
    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Check that the route is closed at the start and visits every city once
    pub fn is_complete(&self, instance: &TSPInstance) -> bool {
        let route = &self.best_route;
        if route.len() != instance.num_cities() + 1 {
            return false;
        }
        if route.first().map(String::as_str) != Some(instance.start_label())
            || route.last().map(String::as_str) != Some(instance.start_label())
        {
            return false;
        }

        let inner: Option<Vec<usize>> = route[1..route.len() - 1]
            .iter()
            .map(|label| instance.city_index(label))
            .collect();
        inner.map(|tour| instance.is_valid_tour(&tour)).unwrap_or(false)
    }

    /// Best-ever distance after each generation (running minimum of the history)
    pub fn best_so_far(&self) -> Vec<f64> {
        let mut best = f64::INFINITY;
        self.history
            .iter()
            .map(|&d| {
                best = best.min(d);
                best
            })
            .collect()
    }

    /// Write the convergence history as `generation,best_distance,best_so_far` rows
    pub fn export_history_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["generation", "best_distance", "best_so_far"])?;

        for (gen, (dist, best)) in self.history.iter().zip(self.best_so_far()).enumerate() {
            writer.write_record(&[
                (gen + 1).to_string(),
                format!("{:.6}", dist),
                format!("{:.6}", best),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Best route found:")?;
        writeln!(f, "{}", self.best_route.join(" -> "))?;
        writeln!(f, "Total distance: {:.2}", self.best_distance)?;
        writeln!(f, "Generations: {} (best found in generation {})", self.generations(), self.best_generation)?;
        writeln!(f, "Seed: {}", self.seed)?;
        write!(f, "Time: {:.4}s", self.elapsed)
    }
}
