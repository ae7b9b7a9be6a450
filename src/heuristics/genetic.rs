//! Genetic Algorithm for the fixed-start TSP.
//!
//! The run is driven by a single [`ChaCha8Rng`] owned by [`GeneticAlgorithm`].
//! It is consumed in a fixed order: the initial shuffles, then for every child
//! the two tournament draws, the crossover cut points and the mutation coin
//! flips. Given a seed, the whole run is reproducible bit for bit.
//!
//! Each generation ranks the population, carries the `elite_size` best tours
//! over unchanged, breeds the rest with tournament selection, order crossover
//! and swap mutation, then re-evaluates every tour against the distance table.

use crate::error::{Result, SolverError};
use crate::heuristics::operators::{
    initial_population, ordered_crossover, swap_mutation, tournament_selection, Tour,
};
use crate::instance::TSPInstance;
use crate::solution::RunResult;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GAConfig {
    /// Number of generations
    pub generations: usize,
    /// Population size
    pub pop_size: usize,
    /// Best individuals copied unchanged into the next generation
    pub elite_size: usize,
    /// Per-position swap probability
    pub mutation_rate: f64,
    /// Tournament size for selection
    pub tournament_k: usize,
    /// Random seed; `None` draws one from entropy
    pub seed: Option<u64>,
    /// Progress cadence in generations; `None` means every tenth of the run
    pub report_every: Option<usize>,
    /// Emit progress lines through `log`
    pub verbose: bool,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            generations: 500,
            pop_size: 200,
            elite_size: 5,
            mutation_rate: 0.02,
            tournament_k: 5,
            seed: None,
            report_every: None,
            verbose: true,
        }
    }
}

impl GAConfig {
    /// Set the number of generations
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Set the population size
    pub fn with_pop_size(mut self, n: usize) -> Self {
        self.pop_size = n;
        self
    }

    /// Set how many elites survive each generation
    pub fn with_elite_size(mut self, n: usize) -> Self {
        self.elite_size = n;
        self
    }

    /// Set the per-position swap probability
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the tournament size
    pub fn with_tournament_k(mut self, k: usize) -> Self {
        self.tournament_k = k;
        self
    }

    /// Fix the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Report progress every `every` generations
    pub fn with_report_every(mut self, every: usize) -> Self {
        self.report_every = Some(every);
        self
    }

    /// Enable or disable progress logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check every parameter before a run starts
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(SolverError::InvalidConfig(msg)) };

        if self.generations == 0 {
            return invalid("generations must be positive".into());
        }
        if self.pop_size == 0 {
            return invalid("pop_size must be positive".into());
        }
        if self.elite_size >= self.pop_size {
            return invalid(format!(
                "elite_size ({}) must be smaller than pop_size ({})",
                self.elite_size, self.pop_size
            ));
        }
        if self.tournament_k == 0 || self.tournament_k > self.pop_size {
            return invalid(format!(
                "tournament_k ({}) must be between 1 and pop_size ({})",
                self.tournament_k, self.pop_size
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid(format!("mutation_rate ({}) must be within [0, 1]", self.mutation_rate));
        }
        if self.report_every == Some(0) {
            return invalid("report_every must be positive".into());
        }
        Ok(())
    }

    fn report_interval(&self) -> usize {
        self.report_every.unwrap_or((self.generations / 10).max(1))
    }
}

/// Produce the next generation from `population` and its `fitnesses`.
///
/// Returns the new population and its freshly computed fitness vector, both of
/// length `config.pop_size`.
pub fn evolve<R: Rng + ?Sized>(
    instance: &TSPInstance,
    population: &[Tour],
    fitnesses: &[f64],
    config: &GAConfig,
    rng: &mut R,
) -> (Vec<Tour>, Vec<f64>) {
    let mut ranked: Vec<usize> = (0..population.len()).collect();
    ranked.sort_by_key(|&i| OrderedFloat(fitnesses[i]));

    let mut new_population: Vec<Tour> = Vec::with_capacity(config.pop_size);
    new_population.extend(
        ranked
            .iter()
            .take(config.elite_size)
            .map(|&i| population[i].clone()),
    );

    while new_population.len() < config.pop_size {
        let parent1 = tournament_selection(population, fitnesses, config.tournament_k, rng);
        let parent2 = tournament_selection(population, fitnesses, config.tournament_k, rng);

        let mut child = ordered_crossover(&parent1, &parent2, rng);
        swap_mutation(&mut child, config.mutation_rate, rng);

        debug_assert!(instance.is_valid_tour(&child), "offspring is not a valid tour: {:?}", child);
        new_population.push(child);
    }

    let new_fitnesses = evaluate(instance, &new_population);
    (new_population, new_fitnesses)
}

/// Tour length of every individual
pub fn evaluate(instance: &TSPInstance, population: &[Tour]) -> Vec<f64> {
    population.iter().map(|tour| instance.route_distance(tour)).collect()
}

/// Snapshot handed to observers after each generation
#[derive(Debug)]
pub struct GenerationReport<'a> {
    /// 1-based generation number
    pub generation: usize,
    pub population: &'a [Tour],
    pub fitnesses: &'a [f64],
    /// Best fitness in this generation
    pub generation_best: f64,
    /// Best fitness seen so far in the run
    pub best_distance: f64,
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GAConfig,
    instance: TSPInstance,
    rng: ChaCha8Rng,
    seed: u64,
}

impl GeneticAlgorithm {
    /// Validate `config` and seed the random source.
    pub fn new(instance: TSPInstance, config: GAConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let rng = ChaCha8Rng::seed_from_u64(seed);

        Ok(GeneticAlgorithm {
            config,
            instance,
            rng,
            seed,
        })
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    pub fn instance(&self) -> &TSPInstance {
        &self.instance
    }

    /// Seed driving this run
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run all generations and return the best route found
    pub fn run(self) -> RunResult {
        self.run_with_observer(|_| {})
    }

    /// Like [`run`](Self::run), calling `observer` after every generation
    pub fn run_with_observer<F>(mut self, mut observer: F) -> RunResult
    where
        F: FnMut(&GenerationReport<'_>),
    {
        let started = Instant::now();
        let genes = self.instance.identity_tour();
        let mut population = initial_population(self.config.pop_size, &genes, &mut self.rng);
        let mut fitnesses = evaluate(&self.instance, &population);

        if self.config.verbose {
            log::info!(
                "[GA] {} cities, start {}, pop {}, elite {}, k {}, mutation {}, seed {}",
                self.instance.num_cities(),
                self.instance.start_label(),
                self.config.pop_size,
                self.config.elite_size,
                self.config.tournament_k,
                self.config.mutation_rate,
                self.seed
            );
        }

        let mut best: Option<(Tour, f64, usize)> = None;
        let mut history = Vec::with_capacity(self.config.generations);
        let interval = self.config.report_interval();

        for gen in 1..=self.config.generations {
            let (next_population, next_fitnesses) =
                evolve(&self.instance, &population, &fitnesses, &self.config, &mut self.rng);
            population = next_population;
            fitnesses = next_fitnesses;

            let gen_best_idx = (0..population.len())
                .min_by_key(|&i| OrderedFloat(fitnesses[i]))
                .expect("population is never empty");
            let gen_best = fitnesses[gen_best_idx];
            history.push(gen_best);

            let improved = match &best {
                Some((_, best_distance, _)) => gen_best < *best_distance,
                None => true,
            };
            if improved {
                best = Some((population[gen_best_idx].clone(), gen_best, gen));
                log::debug!("[GA] Gen {} new best {:.3}", gen, gen_best);
            }

            let best_distance = best.as_ref().map_or(gen_best, |(_, d, _)| *d);

            if self.config.verbose
                && (gen == 1 || gen % interval == 0 || gen == self.config.generations)
            {
                log::info!(
                    "[GA] Gen {:4} Best distance: {:.2} (overall best: {:.2})",
                    gen,
                    gen_best,
                    best_distance
                );
            }

            observer(&GenerationReport {
                generation: gen,
                population: &population,
                fitnesses: &fitnesses,
                generation_best: gen_best,
                best_distance,
            });
        }

        let (best_tour, best_distance, best_generation) =
            best.expect("at least one generation is run");

        RunResult::from_tour(
            &self.instance,
            &best_tour,
            best_distance,
            history,
            best_generation,
            self.seed,
            started.elapsed().as_secs_f64(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::City;

    fn small_config() -> GAConfig {
        GAConfig::default()
            .with_generations(60)
            .with_pop_size(40)
            .with_elite_size(2)
            .with_tournament_k(3)
            .with_seed(42)
            .with_verbose(false)
    }

    #[test]
    fn test_default_config() {
        let config = GAConfig::default();
        assert_eq!(config.generations, 500);
        assert_eq!(config.pop_size, 200);
        assert_eq!(config.elite_size, 5);
        assert_eq!(config.mutation_rate, 0.02);
        assert_eq!(config.tournament_k, 5);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let bad = [
            GAConfig::default().with_generations(0),
            GAConfig::default().with_pop_size(0),
            GAConfig::default().with_pop_size(5).with_elite_size(5).with_tournament_k(2),
            GAConfig::default().with_tournament_k(0),
            GAConfig::default().with_pop_size(4).with_elite_size(1).with_tournament_k(5),
            GAConfig::default().with_mutation_rate(-0.1),
            GAConfig::default().with_mutation_rate(1.5),
            GAConfig::default().with_mutation_rate(f64::NAN),
            GAConfig::default().with_report_every(0),
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(SolverError::InvalidConfig(_))),
                "accepted {:?}",
                config
            );
            assert!(GeneticAlgorithm::new(TSPInstance::ten_cities(), config).is_err());
        }
    }

    #[test]
    fn test_boundary_configs_accepted() {
        let config = GAConfig::default()
            .with_pop_size(3)
            .with_elite_size(2)
            .with_tournament_k(3)
            .with_mutation_rate(1.0);
        assert!(config.validate().is_ok());
        assert!(GAConfig::default().with_elite_size(0).with_mutation_rate(0.0).validate().is_ok());
    }

    #[test]
    fn test_evolve_keeps_size_and_elites() {
        let instance = TSPInstance::ten_cities();
        let config = small_config().with_elite_size(4);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let population = initial_population(config.pop_size, &instance.identity_tour(), &mut rng);
        let fitnesses = evaluate(&instance, &population);
        let (next, next_fitnesses) = evolve(&instance, &population, &fitnesses, &config, &mut rng);

        assert_eq!(next.len(), config.pop_size);
        assert_eq!(next_fitnesses.len(), config.pop_size);

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by_key(|&i| OrderedFloat(fitnesses[i]));
        for (slot, &i) in ranked.iter().take(4).enumerate() {
            assert_eq!(next[slot], population[i]);
            assert_eq!(next_fitnesses[slot], fitnesses[i]);
        }

        for (tour, &fit) in next.iter().zip(&next_fitnesses) {
            assert!(instance.is_valid_tour(tour));
            assert_eq!(fit, instance.route_distance(tour));
        }
    }

    #[test]
    fn test_determinism_under_seed() {
        let a = GeneticAlgorithm::new(TSPInstance::ten_cities(), small_config()).unwrap().run();
        let b = GeneticAlgorithm::new(TSPInstance::ten_cities(), small_config()).unwrap().run();
        assert_eq!(a, b);

        let c = GeneticAlgorithm::new(TSPInstance::ten_cities(), small_config().with_seed(7))
            .unwrap()
            .run();
        assert_eq!(c.seed, 7);
    }

    #[test]
    fn test_unseeded_run_is_replayable() {
        let mut config = small_config();
        config.seed = None;

        let ga = GeneticAlgorithm::new(TSPInstance::ten_cities(), config.clone()).unwrap();
        let seed = ga.seed();
        let first = ga.run();

        let replay = GeneticAlgorithm::new(TSPInstance::ten_cities(), config.with_seed(seed))
            .unwrap()
            .run();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_best_ever_is_monotonic() {
        let ga = GeneticAlgorithm::new(TSPInstance::ten_cities(), small_config().with_elite_size(0)).unwrap();
        let mut best_seen = Vec::new();
        let result = ga.run_with_observer(|report| best_seen.push(report.best_distance));

        assert_eq!(best_seen.len(), 60);
        assert!(best_seen.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(best_seen, result.best_so_far());

        let min = result.history.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(result.best_distance, min);
        assert_eq!(result.history[result.best_generation - 1], result.best_distance);
    }

    #[test]
    fn test_elitism_non_regression() {
        let ga = GeneticAlgorithm::new(TSPInstance::ten_cities(), small_config().with_elite_size(1)).unwrap();
        let result = ga.run();

        assert!(result.history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_permutation_invariant_every_generation() {
        let instance = TSPInstance::ten_cities();
        let ga = GeneticAlgorithm::new(instance.clone(), small_config().with_mutation_rate(0.2)).unwrap();

        let mut generations = 0;
        ga.run_with_observer(|report| {
            generations += 1;
            assert_eq!(report.population.len(), 40);
            for (tour, &fit) in report.population.iter().zip(report.fitnesses) {
                assert!(instance.is_valid_tour(tour));
                assert_eq!(fit, instance.route_distance(tour));
            }
        });
        assert_eq!(generations, 60);
    }

    #[test]
    fn test_zero_mutation_zero_elitism() {
        let instance = TSPInstance::ten_cities();
        let config = small_config()
            .with_generations(200)
            .with_elite_size(0)
            .with_mutation_rate(0.0);
        let ga = GeneticAlgorithm::new(instance.clone(), config).unwrap();

        let result = ga.run_with_observer(|report| {
            assert!(report.population.iter().all(|t| instance.is_valid_tour(t)));
        });
        assert!(result.is_complete(&instance));
    }

    #[test]
    fn test_degenerate_instances() {
        let solo = TSPInstance::new("solo", vec![City::new("A", 0.0, 0.0)], "A").unwrap();
        let result = GeneticAlgorithm::new(solo, small_config()).unwrap().run();
        assert_eq!(result.best_route, vec!["A", "A"]);
        assert_eq!(result.best_distance, 0.0);

        let pair = TSPInstance::new(
            "pair",
            vec![City::new("A", 0.0, 0.0), City::new("B", 3.0, 4.0)],
            "A",
        )
        .unwrap();
        let result = GeneticAlgorithm::new(pair, small_config()).unwrap().run();
        assert_eq!(result.best_route, vec!["A", "B", "A"]);
        assert!((result.best_distance - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_ten_city_run() {
        let instance = TSPInstance::ten_cities();
        let identity = instance.route_distance(&instance.identity_tour());
        let config = GAConfig {
            generations: 800,
            pop_size: 300,
            elite_size: 8,
            mutation_rate: 0.03,
            tournament_k: 7,
            seed: Some(42),
            report_every: None,
            verbose: false,
        };

        let result = GeneticAlgorithm::new(instance.clone(), config).unwrap().run();

        assert_eq!(result.best_route.len(), 11);
        assert!(result.is_complete(&instance));
        assert!(result.best_distance < identity);
        assert_eq!(result.history.len(), 800);
    }
}
