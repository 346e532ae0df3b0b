//! Question selection: randomized pool sampling plus the focused/general/
//! fallback information-gain cascade.

use super::config::SessionConfig;
use crate::belief::{BeliefState, MASS_EPSILON, best_informative_attribute};
use crate::model::knowledge::KnowledgeBase;
use rand::Rng;
use rand::seq::index;

/// Picks the next attribute to ask, or `None` when every attribute has been
/// used.
///
/// Updates the belief's randomness coefficient as a side effect: zero while a
/// retry is pending, the settled value once past the minimum-question
/// threshold. The sampled attribute pool is re-sorted so the information-gain
/// tie-break stays deterministic for a given seed.
pub(crate) fn select_next_question<R: Rng + ?Sized>(
    kb: &KnowledgeBase,
    state: &mut BeliefState,
    config: &SessionConfig,
    rng: &mut R,
) -> Option<String> {
    if state.retry_pending() {
        state.set_randomness(0.0);
    } else if state.questions_asked() > config.min_questions {
        state.set_randomness(config.settled_randomness);
    }

    let mut pool: Vec<String> = kb
        .attributes()
        .iter()
        .filter(|attribute| !state.is_asked(attribute))
        .cloned()
        .collect();
    if pool.is_empty() {
        return None;
    }

    let randomness = state.randomness();
    if randomness > 0.0 && pool.len() > 1 {
        let sample_size = (((1.0 - randomness) * pool.len() as f64).round() as usize)
            .max(1)
            .min(pool.len());
        if sample_size < pool.len() {
            let chosen = index::sample(rng, pool.len(), sample_size);
            let mut sampled: Vec<String> =
                chosen.iter().map(|position| pool[position].clone()).collect();
            sampled.sort();
            pool = sampled;
        }
    }

    let mut next = None;
    if state.questions_asked() >= config.min_questions {
        let focused: Vec<usize> = state
            .top_candidates(config.top_candidates)
            .into_iter()
            .filter(|&(_, prob)| prob > MASS_EPSILON)
            .map(|(index, _)| index)
            .collect();
        if focused.len() > 1 {
            next = best_informative_attribute(kb, state, &focused, &pool).map(str::to_owned);
        }
    }

    if next.is_none() {
        let active = state.active_indices();
        next = best_informative_attribute(kb, state, &active, &pool).map(str::to_owned);
    }

    next.or_else(|| pool.first().cloned())
}
