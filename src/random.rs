//! Random sources and weighted choices shared by mutation and breeding.

use crate::constants::{WEIGHT_HIGH, WEIGHT_LOW};
use core::cmp::min;
use rand::{seq::IndexedRandom, Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// A table of relative weights, one per kind of event. Weights need not sum to 1, and events
/// with a weight of 0 never happen.
pub trait Weighted {
    type Kind: Copy;

    fn weights(&self) -> Vec<(Self::Kind, f64)>;

    /// Pick one kind, with probability proportional to its weight. None if every weight is 0
    fn pick(&self, rng: &mut impl Rng) -> Option<Self::Kind> {
        self.weights()
            .choose_weighted(rng, |(_, w)| w.max(0.))
            .ok()
            .map(|(kind, _)| *kind)
    }
}

/// A fresh value uniformly distributed in `[WEIGHT_LOW, WEIGHT_HIGH]`
pub fn uniform(rng: &mut impl Rng) -> f64 {
    // bounds are constant and ordered
    Uniform::new_inclusive(WEIGHT_LOW, WEIGHT_HIGH)
        .map(|d| d.sample(rng))
        .unwrap_or(0.)
}

/// Small, fast generator for seeded and reproducible evolution runs
#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_ne_bytes()[..lim]);
            idx += lim;
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::seeded(state)
    }
}

/// A [WyRng] seeded from the thread-local generator
pub fn default_rng() -> WyRng {
    WyRng::seeded(rand::rng().next_u64())
}
