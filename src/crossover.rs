//! Genomic distance, used to cluster genomes into species, and crossover between two parents.

use crate::{
    constants::{round_to, ROUND_DECIMALS},
    genome::Genome,
    settings::DistanceWeights,
};
use core::cmp::{max, min};

#[inline]
fn ratio(n: f64, d: f64) -> f64 {
    if d == 0. {
        0.
    } else {
        n / d
    }
}

/// Weighted sum of the differences between two genomes, rounded to [ROUND_DECIMALS] places:
/// - node count difference, relative to the larger genome
/// - connections present in only one genome, relative to the larger connection set
/// - mean weight difference of connections present in both
/// - mean bias difference of nodes present in both
/// - fraction of nodes present in both whose activation differs
///
/// Every term is symmetric in `x` and `y`, and a term with nothing to compare contributes 0
pub fn genomic_distance(x: &Genome, y: &Genome, weights: &DistanceWeights) -> f64 {
    let (x_nodes, y_nodes) = (x.total_nodes(), y.total_nodes());
    let node_diff = ratio(x_nodes.abs_diff(y_nodes) as f64, max(x_nodes, y_nodes) as f64);

    let mut matching = 0usize;
    let mut weight_diff = 0.;
    // summed in key order, so swapping x and y gives a bit-identical result
    for pos in x.sorted_connections() {
        if let Some(yc) = y.connections.get(&pos) {
            matching += 1;
            weight_diff += (x.connections[&pos].weight - yc.weight).abs();
        }
    }
    let disjoint = x.total_connections() + y.total_connections() - 2 * matching;
    let connection_diff = ratio(
        disjoint as f64,
        max(x.total_connections(), y.total_connections()) as f64,
    );
    let weight_diff = ratio(weight_diff, matching as f64);

    let common = min(x_nodes, y_nodes);
    let (bias_diff, activation_diff) = x.nodes[..common].iter().zip(&y.nodes[..common]).fold(
        (0., 0.),
        |(bias, activation), (xn, yn)| {
            (
                bias + (xn.bias - yn.bias).abs(),
                activation + if xn.activation == yn.activation { 0. } else { 1. },
            )
        },
    );
    let bias_diff = ratio(bias_diff, common as f64);
    let activation_diff = ratio(activation_diff, common as f64);

    round_to(
        weights.node * node_diff
            + weights.connection * connection_diff
            + weights.weight * weight_diff
            + weights.bias * bias_diff
            + weights.activation * activation_diff,
        ROUND_DECIMALS,
    )
}

/// Breed a child from `x` and `y`. The child copies `x`'s nodes, then takes every connection of
/// `y` that both endpoints exist for and that can be oriented by depth in the child, then fills in
/// `x`'s remaining connections. Matching connections therefore carry `y`'s genes
pub fn genomic_crossover(x: &Genome, y: &Genome) -> Genome {
    let mut child = x.clone();
    child.connections.clear();

    for pos in y.sorted_connections() {
        if let Some(oriented) = child.check_pair(pos) {
            if !child.connections.contains_key(&oriented) {
                child.connections.insert(oriented, y.connections[&pos]);
            }
        }
    }

    for (pos, c) in x.connections.iter() {
        child.connections.entry(*pos).or_insert(*c);
    }

    child.adjusted_fitness = 0.;
    child.reset();
    debug_assert!(child.is_acyclic());
    child
}
