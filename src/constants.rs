//! Centralized constants for neat4.
//!
//! Tunable evolution parameters live in [crate::settings::Settings]; the values here are the
//! fixed numeric properties of the algorithm itself.

// ============================================================================
// Gene Parameters
// ============================================================================

/// Upper bound for fresh weights, biases and perturbation deltas
pub const WEIGHT_HIGH: f64 = 1.0;

/// Lower bound for fresh weights, biases and perturbation deltas
pub const WEIGHT_LOW: f64 = -1.0;

/// Weight given to the `(from, new)` half of a bisected connection
pub const BISECT_WEIGHT: f64 = 1.0;

// ============================================================================
// Activation Parameters
// ============================================================================

/// Pre-activation clamp for the exponential activations
pub const EXP_CLAMP: f64 = 60.0;

/// Input scale applied before `tanh`
pub const TANH_SCALE: f64 = 2.5;

/// Input scale applied before `sigmoid`
pub const SIGMOID_SCALE: f64 = 5.0;

/// Floor applied before taking the natural log
pub const LOG_FLOOR: f64 = 1e-7;

/// Slope of leaky relu for negative input
pub const LEAKY_SLOPE: f64 = 0.01;

// ============================================================================
// Mutation Parameters
// ============================================================================

/// Rejection-sampling attempts when searching for a new connection pair
pub const PAIR_ATTEMPTS: usize = 100;

/// Number of times a mutation may be redrawn after a structural no-op
pub const MUTATION_ATTEMPTS: usize = 10;

/// Decimal places kept by the saliency probe inputs
pub const SALIENCY_INPUT_DECIMALS: i32 = 3;

// ============================================================================
// Population Parameters
// ============================================================================

/// Decimal places kept by genomic distances and specie fitness means
pub const ROUND_DECIMALS: i32 = 7;

/// Every n-th genome created while topping up the population is a clone of the champion
pub const CLONE_BEST_EVERY: usize = 3;

// ============================================================================
// Files
// ============================================================================

/// Name of the settings file inside a settings directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Extension appended to saved populations
pub const NEAT_EXTENSION: &str = "neat";

/// Round `x` to `decimals` decimal places
#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}
