//! Tunable parameters for a [crate::Neat] run, persisted as `settings.json` in a settings
//! directory.

use crate::{
    activation::{get_activation, Activation},
    constants::SETTINGS_FILE,
    error::NeatError,
    genome::Mutation,
    random::Weighted,
    serde_traits::JsonFile,
};
use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// generations at which a driver should checkpoint the population
    pub save_intervals: Vec<usize>,
    /// largest genomic distance at which a genome still joins a specie
    pub delta_genome_threshold: f64,
    pub distance_weights: DistanceWeights,
    pub node_info: NodeInfo,
    /// 0 disables the bound
    pub max_fitness: f64,
    /// 0 disables the bound
    pub max_generations: usize,
    pub max_fitness_history: usize,
    /// fraction of each specie culled per generation
    pub kill: f64,
    pub elitism: bool,
    /// population fitness sums at or below this mutate everyone instead of breeding
    pub fitness_floor: f64,
    /// purge near-duplicates every n generations, 0 never does
    pub remove_duplicate_interval: usize,
    pub duplicate_distance_threshold: f64,
    pub breed_probabilities: BreedProbabilities,
    pub mutation_probabilities: MutationProbabilities,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_intervals: vec![],
            delta_genome_threshold: 0.75,
            distance_weights: DistanceWeights::default(),
            node_info: NodeInfo::default(),
            max_fitness: 0.,
            max_generations: 0,
            max_fitness_history: 30,
            kill: 0.7,
            elitism: false,
            fitness_floor: 0.,
            remove_duplicate_interval: 50,
            duplicate_distance_threshold: 0.001,
            breed_probabilities: BreedProbabilities::default(),
            mutation_probabilities: MutationProbabilities::default(),
        }
    }
}

impl Settings {
    /// Load `settings.json` from `dir`. A missing file is an error, never a fallback to defaults
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, NeatError> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        let settings = Self::from_file(&path)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), NeatError> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        self.to_file(&path)?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }
}

/// Per-term scale of [crate::crossover::genomic_distance]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceWeights {
    pub activation: f64,
    pub node: f64,
    pub connection: f64,
    pub weight: f64,
    pub bias: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            activation: 0.1,
            node: 0.5,
            connection: 1.0,
            weight: 1.0,
            bias: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    /// activation names new genomes and activation mutations draw from. Unknown names resolve to a
    /// random activation
    pub activations: Vec<String>,
    pub max_depth: usize,
}

impl Default for NodeInfo {
    fn default() -> Self {
        Self {
            activations: vec![Activation::Tanh.name().to_owned()],
            max_depth: 5,
        }
    }
}

impl NodeInfo {
    /// The activation fresh genomes start with: the first listed
    pub fn initial_activation(&self, rng: &mut impl Rng) -> Activation {
        get_activation(self.activations.first().map(String::as_str), rng)
    }

    /// Any one of the listed activations
    pub fn random_activation(&self, rng: &mut impl Rng) -> Activation {
        let name = self.activations.choose(rng).map(String::as_str);
        get_activation(name, rng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crossover {
    Interspecies,
    Intraspecies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breed {
    Asexual,
    Sexual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverProbabilities {
    pub interspecies: f64,
    pub intraspecies: f64,
}

impl Default for CrossoverProbabilities {
    fn default() -> Self {
        Self {
            interspecies: 0.01,
            intraspecies: 0.1,
        }
    }
}

impl Weighted for CrossoverProbabilities {
    type Kind = Crossover;

    fn weights(&self) -> Vec<(Crossover, f64)> {
        vec![
            (Crossover::Interspecies, self.interspecies),
            (Crossover::Intraspecies, self.intraspecies),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedModes {
    pub asexual: f64,
    pub sexual: f64,
}

impl Default for BreedModes {
    fn default() -> Self {
        Self {
            asexual: 0.5,
            sexual: 0.5,
        }
    }
}

impl Weighted for BreedModes {
    type Kind = Breed;

    fn weights(&self) -> Vec<(Breed, f64)> {
        vec![(Breed::Asexual, self.asexual), (Breed::Sexual, self.sexual)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedProbabilities {
    pub crossover: CrossoverProbabilities,
    pub breed: BreedModes,
}

/// Relative weight of every mutation operator. Structural operators are rarer than parametric ones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationProbabilities {
    pub node_activation: f64,
    pub node_bias_set: f64,
    pub node_bias_adjust: f64,
    pub node_add: f64,
    pub node_remove: f64,
    pub connection_add: f64,
    pub connection_remove: f64,
    pub connection_weight_set: f64,
    pub connection_weight_adjust: f64,
    pub connection_active: f64,
    pub genome_activation: f64,
}

impl Default for MutationProbabilities {
    fn default() -> Self {
        Self {
            node_activation: 0.1,
            node_bias_set: 0.1,
            node_bias_adjust: 0.3,
            node_add: 0.01,
            node_remove: 0.005,
            connection_add: 0.09,
            connection_remove: 0.02,
            connection_weight_set: 0.1,
            connection_weight_adjust: 0.4,
            connection_active: 0.05,
            genome_activation: 0.01,
        }
    }
}

impl MutationProbabilities {
    /// A table where only `mutation` ever happens
    pub fn only(mutation: Mutation) -> Self {
        let mut table = Self {
            node_activation: 0.,
            node_bias_set: 0.,
            node_bias_adjust: 0.,
            node_add: 0.,
            node_remove: 0.,
            connection_add: 0.,
            connection_remove: 0.,
            connection_weight_set: 0.,
            connection_weight_adjust: 0.,
            connection_active: 0.,
            genome_activation: 0.,
        };
        *table.weight_mut(mutation) = 1.;
        table
    }

    fn weight_mut(&mut self, mutation: Mutation) -> &mut f64 {
        match mutation {
            Mutation::NodeActivation => &mut self.node_activation,
            Mutation::NodeBiasSet => &mut self.node_bias_set,
            Mutation::NodeBiasAdjust => &mut self.node_bias_adjust,
            Mutation::NodeAdd => &mut self.node_add,
            Mutation::NodeRemove => &mut self.node_remove,
            Mutation::ConnectionAdd => &mut self.connection_add,
            Mutation::ConnectionRemove => &mut self.connection_remove,
            Mutation::ConnectionWeightSet => &mut self.connection_weight_set,
            Mutation::ConnectionWeightAdjust => &mut self.connection_weight_adjust,
            Mutation::ConnectionActive => &mut self.connection_active,
            Mutation::GenomeActivation => &mut self.genome_activation,
        }
    }
}

impl Weighted for MutationProbabilities {
    type Kind = Mutation;

    fn weights(&self) -> Vec<(Mutation, f64)> {
        vec![
            (Mutation::NodeActivation, self.node_activation),
            (Mutation::NodeBiasSet, self.node_bias_set),
            (Mutation::NodeBiasAdjust, self.node_bias_adjust),
            (Mutation::NodeAdd, self.node_add),
            (Mutation::NodeRemove, self.node_remove),
            (Mutation::ConnectionAdd, self.connection_add),
            (Mutation::ConnectionRemove, self.connection_remove),
            (Mutation::ConnectionWeightSet, self.connection_weight_set),
            (Mutation::ConnectionWeightAdjust, self.connection_weight_adjust),
            (Mutation::ConnectionActive, self.connection_active),
            (Mutation::GenomeActivation, self.genome_activation),
        ]
    }
}
