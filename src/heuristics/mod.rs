//! Heuristics module for the TSP.
//!
//! This module exports the genetic operators and the genetic algorithm built on them.

pub mod operators;
pub mod genetic;

pub use operators::*;
pub use genetic::*;
