//! Mutation operators. A call to [Genome::mutate] applies exactly one of them.

use super::{Connection, Genome};
use crate::{
    constants::{round_to, MUTATION_ATTEMPTS, PAIR_ATTEMPTS, SALIENCY_INPUT_DECIMALS},
    random::{uniform, Weighted},
    settings::{MutationProbabilities, NodeInfo},
};
use rand::{seq::IndexedRandom, Rng};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    NodeActivation,
    NodeBiasSet,
    NodeBiasAdjust,
    NodeAdd,
    NodeRemove,
    ConnectionAdd,
    ConnectionRemove,
    ConnectionWeightSet,
    ConnectionWeightAdjust,
    ConnectionActive,
    GenomeActivation,
}

impl Genome {
    /// Apply one mutation drawn from `probabilities`, then [Genome::reset]. A draw that turns out
    /// to be impossible for this genome is redrawn, a bounded number of times
    pub fn mutate(
        &mut self,
        probabilities: &MutationProbabilities,
        node_info: &NodeInfo,
        rng: &mut impl Rng,
    ) {
        for _ in 0..MUTATION_ATTEMPTS {
            let Some(mutation) = probabilities.pick(rng) else {
                break;
            };
            if self.apply_mutation(mutation, node_info, rng) {
                trace!(?mutation, nodes = self.total_nodes(), "mutated");
                break;
            }
        }
        self.reset();
    }

    /// Apply a specific mutation. Returns false, leaving the genome untouched, when it has nothing
    /// to act on
    pub fn apply_mutation(
        &mut self,
        mutation: Mutation,
        node_info: &NodeInfo,
        rng: &mut impl Rng,
    ) -> bool {
        match mutation {
            Mutation::NodeActivation => self.random_non_input(rng).is_some_and(|key| {
                self.nodes[key].activation = node_info.random_activation(rng);
                true
            }),
            Mutation::NodeBiasSet => self.random_non_input(rng).is_some_and(|key| {
                self.nodes[key].bias = uniform(rng);
                true
            }),
            Mutation::NodeBiasAdjust => self.random_non_input(rng).is_some_and(|key| {
                self.nodes[key].bias += uniform(rng);
                true
            }),
            Mutation::NodeAdd => self.add_node(rng),
            Mutation::NodeRemove => {
                let hidden = self.hidden_nodes();
                hidden
                    .choose(rng)
                    .is_some_and(|&key| self.remove_node(key))
            }
            Mutation::ConnectionAdd => match self.open_pair(PAIR_ATTEMPTS, rng) {
                Some(pos) => {
                    let weight = uniform(rng);
                    self.add_connection(pos, weight)
                }
                None => self.add_node(rng),
            },
            Mutation::ConnectionRemove => self.remove_connection(rng),
            Mutation::ConnectionWeightSet => self.random_connection(rng).is_some_and(|pos| {
                let weight = uniform(rng);
                self.with_connection(pos, |c| c.weight = weight)
            }),
            Mutation::ConnectionWeightAdjust => self.random_connection(rng).is_some_and(|pos| {
                let delta = uniform(rng);
                self.with_connection(pos, |c| c.weight += delta)
            }),
            Mutation::ConnectionActive => self
                .random_connection(rng)
                .is_some_and(|pos| self.with_connection(pos, Connection::toggle)),
            Mutation::GenomeActivation => {
                self.activation = node_info.random_activation(rng);
                true
            }
        }
    }

    /// Bisect a random active connection. False when there is none, or when the chosen one spans
    /// adjacent depths
    pub fn add_node(&mut self, rng: &mut impl Rng) -> bool {
        match self.active_connections().choose(rng) {
            Some(&pos) => self.bisect(pos).is_some(),
            None => false,
        }
    }

    /// Prune the connection whose deactivation changes the outputs least, among those whose
    /// endpoints both keep another connection. Saliency is measured on one random probe input
    pub fn remove_connection(&mut self, rng: &mut impl Rng) -> bool {
        let eligible = self
            .sorted_connections()
            .into_iter()
            .filter(|&pos| {
                let (from, to) = self.count_connected(pos);
                from > 1 && to > 1
            })
            .collect::<Vec<_>>();
        if eligible.is_empty() {
            return false;
        }

        let probe = (0..self.inputs)
            .map(|_| round_to(rng.random::<f64>(), SALIENCY_INPUT_DECIMALS))
            .collect::<Vec<_>>();
        self.reset_outputs();
        let baseline = self.forward(&probe);

        let mut least: Option<((usize, usize), f64)> = None;
        for pos in eligible {
            let Some(active) = self.connections.get(&pos).map(|c| c.active) else {
                continue;
            };
            self.set_active(pos, false);
            let saliency = baseline
                .iter()
                .zip(self.forward(&probe))
                .map(|(l, r)| (l - r).abs())
                .fold(0., f64::max);
            self.set_active(pos, active);

            if least.map_or(true, |(_, s)| saliency < s) {
                least = Some((pos, saliency));
            }
        }

        least.is_some_and(|(pos, _)| self.connections.remove(&pos).is_some())
    }

    #[inline]
    fn set_active(&mut self, pos: (usize, usize), active: bool) {
        if let Some(c) = self.connections.get_mut(&pos) {
            c.active = active;
        }
    }

    fn random_non_input(&self, rng: &mut impl Rng) -> Option<usize> {
        if self.nodes.len() <= self.inputs {
            return None;
        }
        Some(rng.random_range(self.inputs..self.nodes.len()))
    }

    fn random_connection(&self, rng: &mut impl Rng) -> Option<(usize, usize)> {
        self.sorted_connections().choose(rng).copied()
    }

    /// Apply `f` to the connection at `pos`. False, and nothing inserted, when there is none
    #[inline]
    fn with_connection(&mut self, pos: (usize, usize), f: impl FnOnce(&mut Connection)) -> bool {
        if let Some(c) = self.connections.get_mut(&pos) {
            f(c);
            true
        } else {
            false
        }
    }

    fn hidden_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.is_hidden().then_some(idx))
            .collect()
    }
}
