//! A cluster of closely related genomes, and the bookkeeping that decides how it grows, shrinks
//! and dies.

use crate::{
    constants::{round_to, ROUND_DECIMALS},
    crossover::genomic_distance,
    error::ShapeError,
    genome::Genome,
    serialize::SpecieRecord,
    settings::Settings,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A collection of [Genome]s within the compatibility threshold of a representative member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpecieRecord")]
pub struct Specie {
    pub members: Vec<Genome>,
    /// index into `members` of the genome every distance comparison is made against
    pub representative: usize,
    pub fitness_history: VecDeque<f64>,
    pub fitness_mean: f64,
    pub max_fitness_history: usize,
}

impl TryFrom<SpecieRecord> for Specie {
    type Error = ShapeError;

    fn try_from(record: SpecieRecord) -> Result<Self, ShapeError> {
        let members = record.members.len();
        if members > 0 && record.representative >= members {
            return Err(ShapeError::Representative {
                representative: record.representative,
                members,
            });
        }

        Ok(Self {
            members: record.members,
            representative: record.representative,
            fitness_history: record.fitness_history,
            fitness_mean: record.fitness_mean,
            max_fitness_history: record.max_fitness_history,
        })
    }
}

impl Specie {
    pub fn new(max_fitness_history: usize, founder: Genome) -> Self {
        Self {
            members: vec![founder],
            representative: 0,
            fitness_history: VecDeque::with_capacity(max_fitness_history + 1),
            fitness_mean: 0.,
            max_fitness_history,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The representative member. Panics on an empty specie
    #[inline]
    pub fn representative(&self) -> &Genome {
        &self.members[self.representative]
    }

    /// Set every member's adjusted fitness to its share of the specie, and `fitness_mean` to the
    /// mean raw fitness
    pub fn update_fitness(&mut self) {
        if self.members.is_empty() {
            self.fitness_mean = 0.;
            return;
        }

        let n = self.members.len() as f64;
        let mut sum = 0.;
        for member in self.members.iter_mut() {
            member.adjusted_fitness = member.fitness / n;
            sum += member.fitness;
        }
        self.fitness_mean = round_to(sum / n, ROUND_DECIMALS);
    }

    /// Push the current mean onto the bounded history window
    pub fn update_fitness_history(&mut self) {
        self.fitness_history.push_back(self.fitness_mean);
        while self.fitness_history.len() > self.max_fitness_history {
            self.fitness_history.pop_front();
        }
    }

    /// False once the history window is full and its mean no longer beats the oldest entry
    pub fn should_survive(&self) -> bool {
        let Some(&oldest) = self.fitness_history.front() else {
            return true;
        };
        if self.fitness_history.len() < self.max_fitness_history {
            return true;
        }
        let mean = self.fitness_history.iter().sum::<f64>() / self.fitness_history.len() as f64;
        mean > oldest
    }

    /// Cull the specie. With `remove_duplicate`, members closer than the duplicate threshold to
    /// the representative go first. Then only the fittest survive: one with `elitism`, otherwise
    /// `ceil((1 - kill) * len)`
    pub fn kill_genomes(&mut self, remove_duplicate: bool, elitism: bool, settings: &Settings) {
        if self.members.is_empty() {
            return;
        }

        if remove_duplicate {
            let representative = self.representative();
            let keep = self
                .members
                .iter()
                .enumerate()
                .map(|(idx, member)| {
                    idx == self.representative
                        || genomic_distance(member, representative, &settings.distance_weights)
                            >= settings.duplicate_distance_threshold
                })
                .collect::<Vec<_>>();
            let mut keep = keep.into_iter();
            self.members.retain(|_| keep.next().unwrap_or(true));
        }

        self.members
            .sort_by(|l, r| r.fitness.total_cmp(&l.fitness));
        let survivors = if elitism {
            1
        } else {
            ((1. - settings.kill) * self.members.len() as f64).ceil() as usize
        };
        self.members.truncate(survivors);
        self.update_representative();
    }

    /// Make the member with the highest adjusted fitness the representative
    pub fn update_representative(&mut self) {
        self.representative = self
            .members
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, member)| match best {
                Some((_, fit)) if fit >= member.adjusted_fitness => best,
                _ => Some((idx, member.adjusted_fitness)),
            })
            .map_or(0, |(idx, _)| idx);
    }

    /// The member with the highest raw fitness
    pub fn best(&self) -> Option<&Genome> {
        self.members.iter().fold(None, |best, member| match best {
            Some(b) if b.fitness >= member.fitness => Some(b),
            _ => Some(member),
        })
    }
}
