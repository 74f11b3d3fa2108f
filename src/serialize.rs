//! serde helpers for genome connection maps, which JSON cannot key by `(from, to)` directly,
//! and the unchecked on-disk shapes genomes and species are validated from

use crate::{
    activation::Activation,
    genome::{Connection, Genome, Node},
};
use fxhash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

#[derive(Serialize, Deserialize)]
struct ConnectionRecord {
    from: usize,
    to: usize,
    weight: f64,
    active: bool,
}

/// Write a connection map as a list of records, ordered by key so equal genomes serialize equally
pub fn serialize_connections<S: Serializer>(
    connections: &FxHashMap<(usize, usize), Connection>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut records = connections
        .iter()
        .map(|(&(from, to), c)| ConnectionRecord {
            from,
            to,
            weight: c.weight,
            active: c.active,
        })
        .collect::<Vec<_>>();
    records.sort_unstable_by_key(|r| (r.from, r.to));

    records.serialize(serializer)
}

pub fn deserialize_connections<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FxHashMap<(usize, usize), Connection>, D::Error> {
    Vec::<ConnectionRecord>::deserialize(deserializer).map(|v| {
        v.into_iter()
            .map(|r| {
                (
                    (r.from, r.to),
                    Connection {
                        weight: r.weight,
                        active: r.active,
                    },
                )
            })
            .collect()
    })
}

/// A [Genome](crate::Genome) as read from disk, before its indices are checked
#[derive(Deserialize)]
pub struct GenomeRecord {
    pub inputs: usize,
    pub outputs: usize,
    pub nodes: Vec<Node>,
    #[serde(deserialize_with = "deserialize_connections")]
    pub connections: FxHashMap<(usize, usize), Connection>,
    pub fitness: f64,
    pub adjusted_fitness: f64,
    pub activation: Activation,
    pub max_depth: usize,
}

/// A [Specie](crate::Specie) as read from disk, before its representative is checked
#[derive(Deserialize)]
pub struct SpecieRecord {
    pub members: Vec<Genome>,
    pub representative: usize,
    pub fitness_history: VecDeque<f64>,
    pub fitness_mean: f64,
    pub max_fitness_history: usize,
}
