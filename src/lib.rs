//! TSP-GA Solver Library
//!
//! A genetic algorithm solver for the Traveling Salesman Problem with a fixed
//! start and end city.
//!
//! # Features
//!
//! - Precomputed Euclidean distance table over a fixed, labelled city set
//! - Tournament selection, order crossover (OX), swap mutation and elitism
//! - Seeded, reproducible runs with per-generation convergence history
//! - TSPLIB and CSV instance loading
//! - Multi-seed benchmarking with CSV export
//!
//! # Example
//!
//! ```no_run
//! use tsp_ga_solver::heuristics::genetic::{GAConfig, GeneticAlgorithm};
//! use tsp_ga_solver::instance::TSPInstance;
//!
//! let instance = TSPInstance::ten_cities();
//! let config = GAConfig::default().with_seed(42);
//!
//! let result = GeneticAlgorithm::new(instance, config)?.run();
//!
//! println!("{}", result.best_route.join(" -> "));
//! println!("Total distance: {:.2}", result.best_distance);
//! # Ok::<(), tsp_ga_solver::SolverError>(())
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;

pub use error::SolverError;
pub use instance::{City, TSPInstance};
pub use solution::RunResult;
