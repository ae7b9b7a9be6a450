//! Genetic operators on permutation tours.
//!
//! A tour is an owned `Vec<usize>` of city indices covering every non-start city
//! exactly once. All operators take the random source explicitly so a run driven
//! by a single seeded generator is reproducible draw for draw.
//!
//! - [`create_individual`] / [`initial_population`]: uniform random permutations
//! - [`tournament_selection`]: best of `k` distinct individuals
//! - [`ordered_crossover`] (OX): slice from parent 1, remainder in parent 2 order
//! - [`swap_mutation`]: independent per-position swap with a random partner

use rand::seq::index;
use rand::seq::SliceRandom;
use rand::Rng;

/// A candidate ordering of the non-start cities
pub type Tour = Vec<usize>;

/// Uniformly random permutation of `genes` (Fisher-Yates shuffle)
pub fn create_individual<R: Rng + ?Sized>(genes: &[usize], rng: &mut R) -> Tour {
    let mut tour = genes.to_vec();
    tour.shuffle(rng);
    tour
}

/// `pop_size` independently shuffled individuals; duplicates are allowed
pub fn initial_population<R: Rng + ?Sized>(pop_size: usize, genes: &[usize], rng: &mut R) -> Vec<Tour> {
    (0..pop_size).map(|_| create_individual(genes, rng)).collect()
}

/// Tournament selection.
///
/// Draws `k` distinct indices without replacement and returns a copy of the
/// individual with the lowest fitness. On equal fitness the first drawn wins.
///
/// # Panics
/// Panics if `k` is zero or larger than the population.
pub fn tournament_selection<R: Rng + ?Sized>(
    population: &[Tour],
    fitnesses: &[f64],
    k: usize,
    rng: &mut R,
) -> Tour {
    assert!(k > 0 && k <= population.len(), "tournament size must be in 1..=population");
    debug_assert_eq!(population.len(), fitnesses.len());

    let drawn = index::sample(rng, population.len(), k);
    let mut best = drawn.index(0);
    for idx in drawn.iter().skip(1) {
        if fitnesses[idx] < fitnesses[best] {
            best = idx;
        }
    }

    population[best].clone()
}

/// Order Crossover (OX).
///
/// Picks two distinct cut points `a < b` and delegates to
/// [`ordered_crossover_with_cuts`]. Tours shorter than two cities are copied
/// from `parent1`.
pub fn ordered_crossover<R: Rng + ?Sized>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Tour {
    let n = parent1.len();
    if n < 2 {
        return parent1.to_vec();
    }

    let cuts = index::sample(rng, n, 2);
    let (x, y) = (cuts.index(0), cuts.index(1));
    ordered_crossover_with_cuts(parent1, parent2, x.min(y), x.max(y))
}

/// Deterministic OX core.
///
/// Child positions `a..=b` are copied from `parent1`; every other position, left
/// to right, takes the next city of `parent2` not already placed.
///
/// # Panics
/// Panics if the parents differ in length, `a > b`, `b` is out of range or
/// the parents are not permutations of the same cities.
pub fn ordered_crossover_with_cuts(parent1: &[usize], parent2: &[usize], a: usize, b: usize) -> Tour {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(a <= b && b < n, "cut points out of range");

    let bound = parent1.iter().chain(parent2).copied().max().map_or(0, |m| m + 1);
    let mut placed = vec![false; bound];
    let mut child = vec![usize::MAX; n];

    for i in a..=b {
        child[i] = parent1[i];
        placed[parent1[i]] = true;
    }

    let mut donor = parent2.iter().copied();
    for i in (0..a).chain(b + 1..n) {
        let city = donor
            .by_ref()
            .find(|&c| !placed[c])
            .expect("parents must be permutations of the same cities");
        child[i] = city;
        placed[city] = true;
    }

    debug_assert!(is_permutation_of(&child, parent1), "OX produced a non-permutation");
    child
}

/// Swap mutation.
///
/// Every position independently, with probability `rate`, swaps with a uniformly
/// drawn position (possibly itself).
pub fn swap_mutation<R: Rng + ?Sized>(tour: &mut [usize], rate: f64, rng: &mut R) {
    let n = tour.len();
    for i in 0..n {
        if rng.gen::<f64>() < rate {
            let j = rng.gen_range(0..n);
            tour.swap(i, j);
        }
    }
}

/// True if `candidate` holds exactly the same cities as `reference`
pub fn is_permutation_of(candidate: &[usize], reference: &[usize]) -> bool {
    if candidate.len() != reference.len() {
        return false;
    }
    let mut a = candidate.to_vec();
    let mut b = reference.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b && a.windows(2).all(|w| w[0] != w[1])
}
