//! Shannon entropy and information-gain scoring over candidate subsets.
//!
//! Pure functions of the belief and knowledge base; nothing here mutates
//! session state.

use super::MASS_EPSILON;
use super::state::BeliefState;
use crate::model::knowledge::KnowledgeBase;

/// Shannon entropy in bits of a weight vector.
///
/// Weights are normalized to sum to 1 first; an empty or collapsed vector has
/// zero entropy.
pub fn entropy(weights: &[f64]) -> f64 {
    if weights.is_empty() {
        return 0.0;
    }
    let total: f64 = weights.iter().sum();
    if total < MASS_EPSILON {
        return 0.0;
    }
    weights
        .iter()
        .map(|&w| w / total)
        .filter(|&p| p > MASS_EPSILON)
        .map(|p| -p * p.log2())
        .sum()
}

/// Picks the attribute with the highest expected entropy reduction over
/// `subset`, considering only attributes in `pool` that have not been asked.
///
/// The first attribute whose gain strictly exceeds all earlier ones wins, so
/// the result is deterministic as long as `pool` iterates in the catalog's
/// sorted order. Returns `None` when the subset carries no mass or no
/// attribute yields positive gain.
pub fn best_informative_attribute<'a>(
    kb: &KnowledgeBase,
    state: &BeliefState,
    subset: &[usize],
    pool: &'a [String],
) -> Option<&'a str> {
    if subset.is_empty() {
        return None;
    }

    let members: Vec<(usize, f64)> = subset
        .iter()
        .map(|&index| (index, state.probability(index)))
        .filter(|&(_, prob)| prob > MASS_EPSILON)
        .collect();
    let subset_total: f64 = members.iter().map(|&(_, prob)| prob).sum();
    if subset_total < MASS_EPSILON {
        return None;
    }

    let member_weights: Vec<f64> = members.iter().map(|&(_, prob)| prob).collect();
    let subset_entropy = entropy(&member_weights);

    let mut best: Option<&str> = None;
    let mut max_gain = -1.0_f64;

    for attribute in pool {
        if state.is_asked(attribute) {
            continue;
        }

        let mut yes_weights = Vec::new();
        let mut no_weights = Vec::new();
        let mut yes_mass = 0.0;
        let mut no_mass = 0.0;
        for &(index, prob) in &members {
            if kb.attribute_value(index, attribute) == 1 {
                yes_weights.push(prob);
                yes_mass += prob;
            } else {
                no_weights.push(prob);
                no_mass += prob;
            }
        }

        let conditional = (yes_mass / subset_total) * entropy(&yes_weights)
            + (no_mass / subset_total) * entropy(&no_weights);
        let gain = subset_entropy - conditional;
        if gain > max_gain {
            max_gain = gain;
            best = Some(attribute.as_str());
        }
    }

    if max_gain > MASS_EPSILON { best } else { None }
}
