//! Per-session probability distribution and bookkeeping.

use super::MASS_EPSILON;
use std::collections::BTreeSet;

/// Mutable belief for a single session.
///
/// Invariants maintained by the update paths:
/// - probabilities are non-negative and, after any successful update, sum to 1
///   within floating tolerance (a failed update leaves the session in a
///   terminal contradiction instead);
/// - `asked` only grows and never exceeds the attribute catalog;
/// - `questions_asked` advances exactly once per processed answer.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefState {
    probs: Vec<f64>,
    asked: BTreeSet<String>,
    questions_asked: u32,
    randomness: f64,
    retry_pending: bool,
}

impl BeliefState {
    /// Uniform distribution over `candidate_count` candidates.
    pub fn new_uniform(candidate_count: usize, initial_randomness: f64) -> Self {
        let weight = if candidate_count == 0 {
            0.0
        } else {
            1.0 / candidate_count as f64
        };
        Self {
            probs: vec![weight; candidate_count],
            asked: BTreeSet::new(),
            questions_asked: 0,
            randomness: initial_randomness,
            retry_pending: false,
        }
    }

    pub(crate) fn from_parts(
        probs: Vec<f64>,
        asked: BTreeSet<String>,
        questions_asked: u32,
        randomness: f64,
        retry_pending: bool,
    ) -> Self {
        Self {
            probs,
            asked,
            questions_asked,
            randomness,
            retry_pending,
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.probs.len()
    }

    pub fn probability(&self, index: usize) -> f64 {
        self.probs[index]
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn total_mass(&self) -> f64 {
        self.probs.iter().sum()
    }

    /// Mass restricted to entries above the zero threshold.
    pub fn active_mass(&self) -> f64 {
        self.probs.iter().filter(|&&p| p > MASS_EPSILON).sum()
    }

    /// Indices of candidates still carrying probability mass.
    pub fn active_indices(&self) -> Vec<usize> {
        self.probs
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > MASS_EPSILON)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.probs.iter().filter(|&&p| p > MASS_EPSILON).count()
    }

    /// Highest-probability candidate; the first index wins a tie so the answer
    /// is stable for a given candidate ordering.
    pub fn leading(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &prob) in self.probs.iter().enumerate() {
            match best {
                Some((_, current)) if prob <= current => {}
                _ => best = Some((index, prob)),
            }
        }
        best
    }

    /// Up to `n` candidates ordered by descending probability. The sort is
    /// stable, so equal probabilities keep candidate order.
    pub fn top_candidates(&self, n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(n);
        ranked
    }

    pub fn is_asked(&self, attribute: &str) -> bool {
        self.asked.contains(attribute)
    }

    /// Records an attribute as asked; returns false if it already was.
    pub(crate) fn mark_asked(&mut self, attribute: &str) -> bool {
        self.asked.insert(attribute.to_string())
    }

    pub fn asked(&self) -> impl Iterator<Item = &str> {
        self.asked.iter().map(String::as_str)
    }

    pub fn asked_count(&self) -> usize {
        self.asked.len()
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub(crate) fn record_question(&mut self) {
        self.questions_asked += 1;
    }

    pub fn randomness(&self) -> f64 {
        self.randomness
    }

    pub(crate) fn set_randomness(&mut self, randomness: f64) {
        self.randomness = randomness.clamp(0.0, 1.0);
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    pub(crate) fn set_retry_pending(&mut self, pending: bool) {
        self.retry_pending = pending;
    }

    pub(crate) fn scale(&mut self, index: usize, factor: f64) {
        self.probs[index] *= factor;
    }

    /// Divides every live entry by `total` and pins dead entries to exactly
    /// zero. Fails (without touching the distribution further) when `total`
    /// has collapsed, which callers must treat as a contradiction.
    pub(crate) fn renormalize(&mut self, total: f64) -> bool {
        if total <= MASS_EPSILON {
            return false;
        }
        for prob in &mut self.probs {
            if *prob > MASS_EPSILON {
                *prob /= total;
            } else {
                *prob = 0.0;
            }
        }
        true
    }
}
