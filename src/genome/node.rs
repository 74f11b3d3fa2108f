use crate::activation::Activation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Input,
    Hidden,
    Output,
}

/// A single neuron. Input nodes sit at depth 0, output nodes at the genome's `max_depth`, and
/// hidden nodes strictly between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub layer_type: LayerType,
    pub activation: Activation,
    pub depth: usize,
    pub bias: f64,
    /// value produced by the most recent forward pass
    #[serde(skip)]
    pub output: f64,
    /// always 0 for feed-forward genomes
    #[serde(default)]
    pub backtrack: usize,
}

impl Node {
    pub fn new(layer_type: LayerType, activation: Activation, depth: usize) -> Self {
        Self {
            layer_type,
            activation,
            depth,
            bias: 0.,
            output: 0.,
            backtrack: 0,
        }
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        matches!(self.layer_type, LayerType::Hidden)
    }

    /// Apply this node's bias and activation to the weighted sum of its inputs, and remember it
    #[inline]
    pub fn fire(&mut self, sum: f64) -> f64 {
        self.output = self.activation.apply(sum + self.bias);
        self.output
    }
}
