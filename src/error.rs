use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures surfaced by loading and saving settings, genomes and populations.
///
/// Evolution itself never fails: impossible mutations are no-ops and a zero fitness sum has its
/// own recovery path.
#[derive(Debug, Error)]
pub enum NeatError {
    /// The requested file does not exist. Loading never falls back to defaults
    #[error("no such file: {0}")]
    NotFound(PathBuf),

    /// The file exists, but does not describe the expected value
    #[error("malformed file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A genome or specie that parsed, but whose indices do not fit together. Surfaces as a
/// deserialization error, so loading a file reports it as [NeatError::Malformed]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{inputs} inputs and {outputs} outputs need more than {nodes} nodes")]
    TooFewNodes {
        inputs: usize,
        outputs: usize,
        nodes: usize,
    },

    #[error("connection {0:?} references a missing node")]
    MissingNode((usize, usize)),

    #[error("connection {0:?} does not point to a deeper node")]
    NotDeeper((usize, usize)),

    #[error("representative {representative} is not one of {members} members")]
    Representative { representative: usize, members: usize },
}
