//! Policy constants for the guess/termination decision logic.

use crate::belief::LikelihoodWeights;
use std::env;

/// Fixed configuration for one session's decision policy.
///
/// Every numeric knob the engine consults lives here; nothing is derived at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Leading-candidate probability required to emit a guess.
    pub certainty_threshold: f64,
    /// Questions that must be answered before any guess is attempted.
    pub min_questions: u32,
    /// Hard cap on answered questions before the session concedes.
    pub max_questions: u32,
    /// Size of the focused subset used for late-game question selection.
    pub top_candidates: usize,
    /// Minimum probability for the lone-survivor guess trigger.
    pub lone_candidate_floor: f64,
    /// Randomness coefficient at session start.
    pub initial_randomness: f64,
    /// Randomness coefficient once past the minimum-question threshold.
    pub settled_randomness: f64,
    /// Likelihood multipliers for answer integration.
    pub weights: LikelihoodWeights,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            certainty_threshold: 0.90,
            min_questions: 5,
            max_questions: 20,
            top_candidates: 5,
            lone_candidate_floor: 0.1,
            initial_randomness: 0.5,
            settled_randomness: 0.1,
            weights: LikelihoodWeights::default(),
        }
    }
}

impl SessionConfig {
    /// Reads overrides from the environment, clamping each value to a sane
    /// range.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            certainty_threshold: parse_env_f64("WHODAT_CERTAINTY", base.certainty_threshold)
                .clamp(0.5, 0.999),
            min_questions: parse_env_u32("WHODAT_MIN_QUESTIONS", base.min_questions).max(1),
            max_questions: parse_env_u32("WHODAT_MAX_QUESTIONS", base.max_questions).max(1),
            top_candidates: parse_env_u32("WHODAT_TOP_CANDIDATES", base.top_candidates as u32)
                .max(2) as usize,
            lone_candidate_floor: parse_env_f64("WHODAT_LONE_FLOOR", base.lone_candidate_floor)
                .clamp(0.0, 0.9),
            initial_randomness: parse_env_f64("WHODAT_RANDOMNESS", base.initial_randomness)
                .clamp(0.0, 1.0),
            settled_randomness: parse_env_f64(
                "WHODAT_SETTLED_RANDOMNESS",
                base.settled_randomness,
            )
            .clamp(0.0, 1.0),
            weights: LikelihoodWeights::from_env(),
        }
    }
}

fn parse_env_f64(key: &str, fallback: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(fallback)
}

fn parse_env_u32(key: &str, fallback: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(fallback)
}
