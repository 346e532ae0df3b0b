//! Likelihood-multiplier belief updates for answers and rejected guesses.

use super::state::BeliefState;
use crate::model::answer::Answer;
use crate::model::knowledge::KnowledgeBase;
use std::env;

/// Tunable multipliers applied when folding an answer into the distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodWeights {
    /// Applied when a crisp answer exactly agrees with the attribute value.
    pub strong_match: f64,
    /// Applied when a crisp answer exactly contradicts the attribute value.
    pub strong_mismatch: f64,
    /// Applied when a "probably" answer leans toward the attribute value.
    pub soft_match: f64,
    /// Applied when a "probably" answer leans away from the attribute value.
    pub soft_mismatch: f64,
    /// Applied to a candidate the player has rejected after a guess.
    pub wrong_guess_penalty: f64,
}

impl Default for LikelihoodWeights {
    fn default() -> Self {
        Self {
            strong_match: 1.35,
            strong_mismatch: 0.2,
            soft_match: 1.1,
            soft_mismatch: 0.5,
            wrong_guess_penalty: 0.01,
        }
    }
}

impl LikelihoodWeights {
    /// Reads overrides from the environment, clamping each multiplier to a
    /// range that keeps updates stable.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            strong_match: parse_env_f64("WHODAT_STRONG_MATCH", base.strong_match)
                .clamp(1.0, 3.0),
            strong_mismatch: parse_env_f64("WHODAT_STRONG_MISMATCH", base.strong_mismatch)
                .clamp(0.01, 1.0),
            soft_match: parse_env_f64("WHODAT_SOFT_MATCH", base.soft_match).clamp(1.0, 2.0),
            soft_mismatch: parse_env_f64("WHODAT_SOFT_MISMATCH", base.soft_mismatch)
                .clamp(0.05, 1.0),
            wrong_guess_penalty: parse_env_f64("WHODAT_GUESS_PENALTY", base.wrong_guess_penalty)
                .clamp(0.001, 0.5),
        }
    }

    fn factor_for(&self, value: f64, answer: f64) -> f64 {
        let diff = (value - answer).abs();
        if diff == 0.0 {
            self.strong_match
        } else if diff == 1.0 {
            self.strong_mismatch
        } else if diff < 0.5 {
            self.soft_match
        } else {
            self.soft_mismatch
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

impl BeliefState {
    /// Folds one answer into the distribution and renormalizes.
    ///
    /// Returns false when the update drives total mass to zero, which the
    /// caller must treat as a terminal contradiction for the session.
    pub fn integrate_answer(
        &mut self,
        kb: &KnowledgeBase,
        attribute: &str,
        answer: Answer,
        weights: &LikelihoodWeights,
    ) -> bool {
        let target = answer.value();
        for index in 0..self.candidate_count() {
            let value = f64::from(kb.attribute_value(index, attribute));
            self.scale(index, weights.factor_for(value, target));
        }
        let total = self.total_mass();
        self.renormalize(total)
    }

    /// Applies the wrong-guess penalty to one candidate and renormalizes over
    /// the remaining live mass. Returns false when nothing viable is left.
    pub fn penalize_candidate(&mut self, index: usize, penalty: f64) -> bool {
        self.scale(index, penalty);
        let total = self.active_mass();
        self.renormalize(total)
    }
}

#[cfg(test)]
mod tests {
    use super::LikelihoodWeights;
    use crate::belief::state::BeliefState;
    use crate::model::answer::Answer;
    use crate::model::knowledge::{CandidateRecord, KnowledgeBase};
    use std::collections::HashMap;

    fn kb(records: &[(&str, &[(&str, u8)])]) -> KnowledgeBase {
        let records = records
            .iter()
            .map(|(name, attrs)| CandidateRecord {
                name: name.to_string(),
                attributes: attrs
                    .iter()
                    .map(|(key, value)| (key.to_string(), *value))
                    .collect(),
            })
            .collect();
        KnowledgeBase::from_records(records, HashMap::new()).unwrap()
    }

    #[test]
    fn successful_update_keeps_distribution_normalized() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)]), ("C", &[])]);
        let mut state = BeliefState::new_uniform(3, 0.5);
        let weights = LikelihoodWeights::default();
        assert!(state.integrate_answer(&kb, "tall", Answer::Probably, &weights));
        assert!((state.total_mass() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn crisp_answer_applies_strong_multipliers() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut state = BeliefState::new_uniform(2, 0.5);
        let weights = LikelihoodWeights::default();
        assert!(state.integrate_answer(&kb, "tall", Answer::Yes, &weights));

        let expected_a = weights.strong_match / (weights.strong_match + weights.strong_mismatch);
        assert!((state.probability(0) - expected_a).abs() < 1e-9);
    }

    #[test]
    fn soft_answer_applies_soft_multipliers() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut state = BeliefState::new_uniform(2, 0.5);
        let weights = LikelihoodWeights::default();
        assert!(state.integrate_answer(&kb, "tall", Answer::ProbablyNot, &weights));

        // |1 - 0.25| > 0.5 is a soft mismatch, |0 - 0.25| < 0.5 a soft match.
        let expected_b = weights.soft_match / (weights.soft_match + weights.soft_mismatch);
        assert!((state.probability(1) - expected_b).abs() < 1e-9);
    }

    #[test]
    fn matching_candidate_probability_never_decreases() {
        let kb = kb(&[
            ("A", &[("tall", 1), ("loud", 0), ("old", 1)]),
            ("B", &[("tall", 0), ("loud", 1)]),
            ("C", &[("tall", 1), ("loud", 1)]),
        ]);
        let mut state = BeliefState::new_uniform(3, 0.5);
        let weights = LikelihoodWeights::default();

        let mut previous = state.probability(0);
        for (attribute, answer) in [
            ("tall", Answer::Yes),
            ("loud", Answer::No),
            ("old", Answer::Yes),
        ] {
            assert!(state.integrate_answer(&kb, attribute, answer, &weights));
            let current = state.probability(0);
            assert!(current >= previous, "probability dropped after {attribute}");
            previous = current;
        }
    }

    #[test]
    fn collapsed_mass_reports_contradiction() {
        let kb = kb(&[("A", &[("tall", 1)])]);
        let mut state = BeliefState::new_uniform(1, 0.5);
        state.scale(0, 0.0);
        let weights = LikelihoodWeights::default();
        assert!(!state.integrate_answer(&kb, "tall", Answer::Yes, &weights));
    }

    #[test]
    fn penalty_demotes_rejected_candidate() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 1)]), ("C", &[])]);
        let mut state = BeliefState::new_uniform(3, 0.5);
        let weights = LikelihoodWeights::default();
        assert!(state.integrate_answer(&kb, "tall", Answer::Yes, &weights));

        let before = state.probability(0);
        assert!(state.penalize_candidate(0, weights.wrong_guess_penalty));
        assert!(state.probability(0) < before);
        assert!(state.probability(0) < state.probability(1));
        assert!((state.total_mass() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn penalizing_sole_survivor_collapses() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut state = BeliefState::new_uniform(2, 0.5);
        let weights = LikelihoodWeights::default();
        assert!(state.integrate_answer(&kb, "tall", Answer::Yes, &weights));

        // Wipe B entirely, then reject A: no viable mass remains.
        state.scale(1, 0.0);
        let total = state.total_mass();
        assert!(state.renormalize(total));
        assert!(!state.penalize_candidate(0, 0.0));
    }
}
