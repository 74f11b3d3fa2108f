//! A single evolvable feed-forward network. Nodes live in a flat arena indexed by id, connections
//! in a map keyed by `(from, to)`. Every connection points from a shallower node to a deeper one,
//! so the graph stays acyclic through any sequence of mutations.

pub mod connection;
pub mod mutate;
pub mod node;

pub use connection::Connection;
pub use mutate::Mutation;
pub use node::{LayerType, Node};

use crate::{
    activation::Activation,
    constants::BISECT_WEIGHT,
    error::ShapeError,
    random::uniform,
    serialize::{serialize_connections, GenomeRecord},
    settings::NodeInfo,
};
use core::ops::Range;
use fxhash::FxHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GenomeRecord")]
pub struct Genome {
    pub inputs: usize,
    pub outputs: usize,
    pub nodes: Vec<Node>,
    #[serde(serialize_with = "serialize_connections")]
    pub connections: FxHashMap<(usize, usize), Connection>,
    pub fitness: f64,
    pub adjusted_fitness: f64,
    /// activation given to hidden nodes created by mutation
    pub activation: Activation,
    pub max_depth: usize,
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = ShapeError;

    /// Accept a record only if its input and output nodes exist and every connection joins two
    /// existing nodes, shallower to deeper
    fn try_from(record: GenomeRecord) -> Result<Self, ShapeError> {
        let nodes = record.nodes.len();
        if record.inputs + record.outputs > nodes {
            return Err(ShapeError::TooFewNodes {
                inputs: record.inputs,
                outputs: record.outputs,
                nodes,
            });
        }

        for &(from, to) in record.connections.keys() {
            if from >= nodes || to >= nodes {
                return Err(ShapeError::MissingNode((from, to)));
            }
            if record.nodes[from].depth >= record.nodes[to].depth {
                return Err(ShapeError::NotDeeper((from, to)));
            }
        }

        Ok(Self {
            inputs: record.inputs,
            outputs: record.outputs,
            nodes: record.nodes,
            connections: record.connections,
            fitness: record.fitness,
            adjusted_fitness: record.adjusted_fitness,
            activation: record.activation,
            max_depth: record.max_depth,
        })
    }
}

impl Genome {
    /// A fresh genome with every input wired to every output by a uniformly random weight
    pub fn new(inputs: usize, outputs: usize, node_info: &NodeInfo, rng: &mut impl Rng) -> Self {
        let activation = node_info.initial_activation(rng);
        let max_depth = node_info.max_depth;

        let mut nodes = Vec::with_capacity(inputs + outputs);
        for _ in 0..inputs {
            nodes.push(Node::new(LayerType::Input, activation, 0));
        }
        for _ in 0..outputs {
            nodes.push(Node::new(LayerType::Output, activation, max_depth));
        }

        let mut genome = Self {
            inputs,
            outputs,
            nodes,
            connections: FxHashMap::default(),
            fitness: 0.,
            adjusted_fitness: 0.,
            activation,
            max_depth,
        };

        for from in genome.input_range() {
            for to in genome.output_range() {
                let weight = uniform(rng);
                genome.add_connection((from, to), weight);
            }
        }

        genome
    }

    #[inline]
    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn total_connections(&self) -> usize {
        self.connections.len()
    }

    #[inline]
    pub fn input_range(&self) -> Range<usize> {
        0..self.inputs
    }

    #[inline]
    pub fn output_range(&self) -> Range<usize> {
        self.inputs..self.inputs + self.outputs
    }

    /// Propagate `inputs` through the network and return the output layer, in id order. Missing
    /// inputs read as 0
    pub fn forward(&mut self, inputs: &[f64]) -> Vec<f64> {
        for (idx, node) in self.nodes[..self.inputs].iter_mut().enumerate() {
            node.output = inputs.get(idx).copied().unwrap_or(0.);
        }

        let mut incoming = vec![Vec::new(); self.nodes.len()];
        for (&(from, to), c) in self.connections.iter() {
            if c.active {
                incoming[to].push((from, c.weight));
            }
        }

        let mut order = (self.inputs..self.nodes.len()).collect::<Vec<_>>();
        order.sort_by_key(|&idx| (self.nodes[idx].depth, idx));

        for idx in order {
            let sum = incoming[idx]
                .iter()
                .map(|&(from, weight)| weight * self.nodes[from].output)
                .sum::<f64>();
            self.nodes[idx].fire(sum);
        }

        self.nodes[self.output_range()]
            .iter()
            .map(|node| node.output)
            .collect()
    }

    /// Clear every node output and the fitness
    pub fn reset(&mut self) {
        self.reset_outputs();
        self.fitness = 0.;
    }

    #[inline]
    fn reset_outputs(&mut self) {
        self.nodes.iter_mut().for_each(|node| node.output = 0.);
    }

    /// Orient `(a, b)` from the shallower node to the deeper one. None for self loops, unknown
    /// nodes, and nodes at equal depth
    pub fn check_pair(&self, (a, b): (usize, usize)) -> Option<(usize, usize)> {
        if a == b {
            return None;
        }
        let (da, db) = (self.nodes.get(a)?.depth, self.nodes.get(b)?.depth);
        if da < db {
            Some((a, b))
        } else if db < da {
            Some((b, a))
        } else {
            None
        }
    }

    /// Insert a new connection at the oriented `pos`. Returns false when the pair is invalid or
    /// already connected
    pub fn add_connection(&mut self, pos: (usize, usize), weight: f64) -> bool {
        match self.check_pair(pos) {
            Some(pos) if !self.connections.contains_key(&pos) => {
                self.connections.insert(pos, Connection::new(weight));
                true
            }
            _ => false,
        }
    }

    /// Split the connection at `pos` with a new hidden node at the midpoint depth. The new node
    /// receives through a weight of 1 and forwards through the old weight, and the old connection
    /// is removed. None when no depth lies strictly between the endpoints
    pub fn bisect(&mut self, pos: (usize, usize)) -> Option<usize> {
        let (from, to) = pos;
        let (df, dt) = (self.nodes.get(from)?.depth, self.nodes.get(to)?.depth);
        let depth = (df + dt).div_ceil(2);
        if !(df < depth && depth < dt) {
            return None;
        }

        let old = self.connections.remove(&pos)?;
        let center = self.nodes.len();
        self.nodes
            .push(Node::new(LayerType::Hidden, self.activation, depth));
        self.connections
            .insert((from, center), Connection::new(BISECT_WEIGHT));
        self.connections
            .insert((center, to), Connection::new(old.weight));

        Some(center)
    }

    /// Remove a hidden node and every connection touching it. Refused unless every neighbour
    /// keeps at least one other connection in the same direction. The last node takes over the
    /// freed id, so ids stay contiguous
    pub fn remove_node(&mut self, key: usize) -> bool {
        if !self.nodes.get(key).is_some_and(Node::is_hidden) {
            return false;
        }

        let (incoming, outgoing) = self.connected(key);
        let removable = incoming
            .iter()
            .all(|&(from, _)| self.out_degree(from) > 1)
            && outgoing.iter().all(|&(_, to)| self.in_degree(to) > 1);
        if !removable {
            return false;
        }

        for pos in incoming.iter().chain(outgoing.iter()) {
            self.connections.remove(pos);
        }

        let last = self.nodes.len() - 1;
        self.nodes.swap_remove(key);
        if key != last {
            let remap = |n: usize| if n == last { key } else { n };
            self.connections = core::mem::take(&mut self.connections)
                .into_iter()
                .map(|((from, to), c)| ((remap(from), remap(to)), c))
                .collect();
        }

        true
    }

    #[inline]
    fn out_degree(&self, node: usize) -> usize {
        self.connections.keys().filter(|(from, _)| *from == node).count()
    }

    #[inline]
    fn in_degree(&self, node: usize) -> usize {
        self.connections.keys().filter(|(_, to)| *to == node).count()
    }

    /// How many connections leave `pos.0`, and how many enter `pos.1`, counting `pos` itself
    pub fn count_connected(&self, (from, to): (usize, usize)) -> (usize, usize) {
        (self.out_degree(from), self.in_degree(to))
    }

    /// Connections entering and leaving `node`, each sorted by key
    pub fn connected(&self, node: usize) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
        let (mut incoming, mut outgoing): (Vec<_>, Vec<_>) = self
            .connections
            .keys()
            .copied()
            .filter(|&(from, to)| from == node || to == node)
            .partition(|&(_, to)| to == node);
        incoming.sort_unstable();
        outgoing.sort_unstable();
        (incoming, outgoing)
    }

    /// Every connection key in ascending order. Random picks draw from this, so that seeded runs
    /// don't depend on hash map layout
    pub fn sorted_connections(&self) -> Vec<(usize, usize)> {
        let mut keys = self.connections.keys().copied().collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    pub fn active_connections(&self) -> Vec<(usize, usize)> {
        let mut keys = self
            .connections
            .iter()
            .filter_map(|(pos, c)| c.active.then_some(*pos))
            .collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    /// Node ids grouped by layer type
    pub fn nodes_by_type(&self) -> BTreeMap<LayerType, Vec<usize>> {
        let mut groups = BTreeMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            groups
                .entry(node.layer_type)
                .or_insert_with(Vec::new)
                .push(idx);
        }
        groups
    }

    /// Node ids grouped by depth, `0..=max_depth`
    pub fn nodes_by_depth(&self) -> Vec<Vec<usize>> {
        let mut depths = vec![Vec::new(); self.max_depth + 1];
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(group) = depths.get_mut(node.depth) {
                group.push(idx);
            }
        }
        depths
    }

    /// A pair of nodes that could be connected but isn't yet, found by rejection sampling
    pub fn open_pair(&self, attempts: usize, rng: &mut impl Rng) -> Option<(usize, usize)> {
        if self.nodes.len() < 2 {
            return None;
        }
        (0..attempts).find_map(|_| {
            let a = rng.random_range(0..self.nodes.len());
            let b = rng.random_range(0..self.nodes.len());
            self.check_pair((a, b))
                .filter(|pos| !self.connections.contains_key(pos))
        })
    }

    /// Every connection runs from a strictly shallower node to a strictly deeper one
    pub fn is_acyclic(&self) -> bool {
        self.connections.keys().all(|&(from, to)| {
            match (self.nodes.get(from), self.nodes.get(to)) {
                (Some(f), Some(t)) => f.depth < t.depth,
                _ => false,
            }
        })
    }
}
