pub mod activation;
pub mod constants;
pub mod crossover;
pub mod error;
pub mod eval;
pub mod genome;
pub mod macros;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod serde_traits;
pub mod serialize;
pub mod settings;
pub mod specie;

pub use activation::{get_activation, Activation};
pub use crossover::{genomic_crossover, genomic_distance};
pub use error::{NeatError, ShapeError};
pub use eval::Evaluate;
pub use genome::{Connection, Genome, LayerType, Mutation, Node};
pub use population::{Neat, NeatInfo};
pub use random::{default_rng, Weighted, WyRng};
pub use serde_traits::JsonFile;
pub use settings::Settings;
pub use specie::Specie;
