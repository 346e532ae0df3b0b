//! Probabilistic belief tracking over the candidate set.
//!
//! This module is composed of:
//! - `state`: the per-session distribution and bookkeeping (`BeliefState`).
//! - `entropy`: Shannon entropy and information-gain scoring over subsets.
//! - `update`: likelihood-multiplier answer integration and the rejected-guess
//!   penalty (`LikelihoodWeights`).

mod entropy;
mod state;
mod update;

pub use entropy::{best_informative_attribute, entropy};
pub use state::BeliefState;
pub use update::LikelihoodWeights;

/// Probability mass at or below this threshold is treated as zero everywhere
/// in the engine.
pub const MASS_EPSILON: f64 = 1e-9;
