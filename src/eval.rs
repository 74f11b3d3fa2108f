//! Fitness evaluation across a whole population. Genomes are independent of each other while
//! they are scored, so with the `parallel` feature the work is spread over rayon's pool.

use crate::{genome::Genome, population::Neat};
use fxhash::FxHashMap;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scores a single genome, where a higher fitness is strictly better. Implementations are free to
/// run forward passes on the genome, but must not depend on other genomes
pub trait Evaluate: Sync {
    fn evaluate(&self, genome: &mut Genome) -> f64;
}

impl<F> Evaluate for F
where
    F: Fn(&mut Genome) -> f64 + Sync,
{
    #[inline]
    fn evaluate(&self, genome: &mut Genome) -> f64 {
        self(genome)
    }
}

impl Neat {
    /// Reset and score every genome, keyed by `(specie, member)`. Every fitness is written exactly
    /// once, after all of them have been computed
    pub fn evaluate(&mut self, evaluator: &impl Evaluate) {
        let scores = self.scores(evaluator);
        debug_assert_eq!(scores.len(), self.current_population());
        for ((specie, member), fitness) in scores {
            self.species[specie].members[member].fitness = fitness;
        }
    }

    #[cfg(feature = "parallel")]
    fn scores(&mut self, evaluator: &impl Evaluate) -> FxHashMap<(usize, usize), f64> {
        self.species
            .par_iter_mut()
            .enumerate()
            .flat_map(|(s, specie)| {
                specie
                    .members
                    .par_iter_mut()
                    .enumerate()
                    .map(move |(g, genome)| {
                        genome.reset();
                        ((s, g), evaluator.evaluate(genome))
                    })
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn scores(&mut self, evaluator: &impl Evaluate) -> FxHashMap<(usize, usize), f64> {
        self.species
            .iter_mut()
            .enumerate()
            .flat_map(|(s, specie)| {
                specie
                    .members
                    .iter_mut()
                    .enumerate()
                    .map(move |(g, genome)| {
                        genome.reset();
                        ((s, g), evaluator.evaluate(genome))
                    })
            })
            .collect()
    }

    /// Score the whole population, then advance one generation
    pub fn parallel_evolve(&mut self, evaluator: &impl Evaluate, rng: &mut impl Rng) {
        self.evaluate(evaluator);
        self.evolve(rng);
    }
}
