//! The fixed registry of scalar activation functions a node may carry.

use crate::constants::{EXP_CLAMP, LEAKY_SLOPE, LOG_FLOOR, SIGMOID_SCALE, TANH_SCALE};
use core::{fmt, str::FromStr};
use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Activation {
    Absolute,
    BinaryStep,
    Clamped,
    Identity,
    Log,
    #[default]
    Tanh,
    LeakyReLU,
    Sigmoid,
    Swish,
}

impl Activation {
    pub const ALL: [Self; 9] = [
        Self::Absolute,
        Self::BinaryStep,
        Self::Clamped,
        Self::Identity,
        Self::Log,
        Self::Tanh,
        Self::LeakyReLU,
        Self::Sigmoid,
        Self::Swish,
    ];

    /// The name this activation is registered under, as used in settings files
    pub fn name(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::BinaryStep => "binaryStep",
            Self::Clamped => "clamped",
            Self::Identity => "identity",
            Self::Log => "log",
            Self::Tanh => "tanh",
            Self::LeakyReLU => "leakyReLU",
            Self::Sigmoid => "sigmoid",
            Self::Swish => "swish",
        }
    }

    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Absolute => x.abs(),
            Self::BinaryStep => {
                if x >= 0. {
                    1.
                } else {
                    0.
                }
            }
            Self::Clamped => x.clamp(-1., 1.),
            Self::Identity => x,
            Self::Log => x.max(LOG_FLOOR).ln(),
            Self::Tanh => (TANH_SCALE * x).clamp(-EXP_CLAMP, EXP_CLAMP).tanh(),
            Self::LeakyReLU => {
                if x > 0. {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Self::Sigmoid => sigmoid(x),
            Self::Swish => x * sigmoid(x),
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1. / (1. + (-(SIGMOID_SCALE * x).clamp(-EXP_CLAMP, EXP_CLAMP)).exp())
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActivation(pub String);

impl FromStr for Activation {
    type Err = UnknownActivation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| UnknownActivation(s.to_owned()))
    }
}

/// The activation registered as `name`, or a uniformly random one when `name` is absent or
/// unknown.
pub fn get_activation(name: Option<&str>, rng: &mut impl Rng) -> Activation {
    match name.map(str::parse::<Activation>) {
        Some(Ok(activation)) => activation,
        _ => *Activation::ALL.choose(rng).unwrap_or(&Activation::Tanh),
    }
}
