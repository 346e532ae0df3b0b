//! The per-session state machine: start, answer, guess handling, snapshots.

use super::config::SessionConfig;
use super::selector::select_next_question;
use crate::belief::BeliefState;
use crate::model::answer::Answer;
use crate::model::knowledge::KnowledgeBase;
use core::fmt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const DEFEAT_MESSAGE: &str = "You beat me! I couldn't guess.";

/// Where the session currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Init,
    Playing,
    GuessPending,
    Won,
    Failure,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionPhase::Init => "init",
            SessionPhase::Playing => "playing",
            SessionPhase::GuessPending => "guess_pending",
            SessionPhase::Won => "won",
            SessionPhase::Failure => "failure",
        };
        f.write_str(text)
    }
}

/// What the hosting layer receives after each turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutput {
    Playing {
        question_text: String,
        attribute_key: String,
        questions_asked: u32,
    },
    MakeGuess {
        guess: String,
        certainty: f64,
    },
    Failure {
        message: String,
        guess: Option<String>,
        certainty: f64,
    },
}

/// Recoverable, session-local request errors. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    DuplicateAttribute { attribute: String },
    UnknownAttribute { attribute: String },
    InvalidPhase {
        operation: &'static str,
        phase: SessionPhase,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DuplicateAttribute { attribute } => {
                write!(f, "attribute {attribute:?} was already asked")
            }
            SessionError::UnknownAttribute { attribute } => {
                write!(f, "attribute {attribute:?} is not in the catalog")
            }
            SessionError::InvalidPhase { operation, phase } => {
                write!(f, "{operation} is not valid while the session is {phase}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// The wire shape hosts send for the `error` turn status.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "status": "error", "message": self.to_string() })
    }
}

/// Full dynamic state of one session, round-trippable through serde so the
/// hosting layer can persist it between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub probabilities: BTreeMap<String, f64>,
    pub asked: Vec<String>,
    pub questions_asked: u32,
    pub randomness: f64,
    pub retry_pending: bool,
    pub phase: SessionPhase,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One player's game against the engine.
///
/// Owns its belief exclusively; the knowledge base is shared read-only with
/// every other session. All methods are synchronous and never block.
#[derive(Debug, Clone)]
pub struct Session {
    kb: Arc<KnowledgeBase>,
    config: SessionConfig,
    belief: BeliefState,
    phase: SessionPhase,
    rng: StdRng,
    seed: u64,
}

impl Session {
    /// Creates a session with a random seed.
    pub fn new(kb: Arc<KnowledgeBase>, config: SessionConfig) -> Self {
        let seed: u64 = rand::random();
        Self::with_seed(kb, config, seed)
    }

    /// Creates a session whose attribute sampling is reproducible from `seed`.
    pub fn with_seed(kb: Arc<KnowledgeBase>, config: SessionConfig, seed: u64) -> Self {
        let belief = BeliefState::new_uniform(kb.candidate_count(), config.initial_randomness);
        Self {
            kb,
            config,
            belief,
            phase: SessionPhase::Init,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Rebuilds a session from a persisted snapshot.
    ///
    /// Probability entries are matched to candidates by name (order does not
    /// matter); names the knowledge base no longer knows are dropped.
    pub fn resume(
        kb: Arc<KnowledgeBase>,
        config: SessionConfig,
        snapshot: &SessionSnapshot,
        seed: u64,
    ) -> Self {
        let probs: Vec<f64> = (0..kb.candidate_count())
            .map(|index| {
                snapshot
                    .probabilities
                    .get(kb.candidate_name(index))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        let asked: BTreeSet<String> = snapshot.asked.iter().cloned().collect();
        let belief = BeliefState::from_parts(
            probs,
            asked,
            snapshot.questions_asked,
            snapshot.randomness,
            snapshot.retry_pending,
        );
        Self {
            kb,
            config,
            belief,
            phase: snapshot.phase,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Captures the full dynamic state for external persistence.
    pub fn snapshot(&self) -> SessionSnapshot {
        let probabilities = self
            .belief
            .probabilities()
            .iter()
            .enumerate()
            .map(|(index, &prob)| (self.kb.candidate_name(index).to_string(), prob))
            .collect();
        SessionSnapshot {
            probabilities,
            asked: self.belief.asked().map(str::to_string).collect(),
            questions_asked: self.belief.questions_asked(),
            randomness: self.belief.randomness(),
            retry_pending: self.belief.retry_pending(),
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    /// Current candidate ranking by name, best first.
    pub fn top_candidates(&self, n: usize) -> Vec<(String, f64)> {
        self.belief
            .top_candidates(n)
            .into_iter()
            .map(|(index, prob)| (self.kb.candidate_name(index).to_string(), prob))
            .collect()
    }

    /// Resets the belief to uniform and serves the first question.
    ///
    /// Moves to `Playing`, or straight to `Failure` when no question can be
    /// produced (an empty attribute catalog).
    pub fn start(&mut self) -> TurnOutput {
        self.belief = BeliefState::new_uniform(
            self.kb.candidate_count(),
            self.config.initial_randomness,
        );
        self.phase = SessionPhase::Playing;

        match select_next_question(&self.kb, &mut self.belief, &self.config, &mut self.rng) {
            Some(attribute) => self.playing_output(attribute),
            None => {
                self.phase = SessionPhase::Failure;
                TurnOutput::Failure {
                    message: "Cannot start: no questions available.".to_string(),
                    guess: None,
                    certainty: 0.0,
                }
            }
        }
    }

    /// Processes one answered question and decides the next move: keep
    /// playing, emit a guess, or concede.
    pub fn answer(&mut self, attribute: &str, answer: Answer) -> Result<TurnOutput, SessionError> {
        if self.phase != SessionPhase::Playing {
            return Err(SessionError::InvalidPhase {
                operation: "answer",
                phase: self.phase,
            });
        }
        if self.belief.is_asked(attribute) {
            return Err(SessionError::DuplicateAttribute {
                attribute: attribute.to_string(),
            });
        }
        if !self.kb.contains_attribute(attribute) {
            return Err(SessionError::UnknownAttribute {
                attribute: attribute.to_string(),
            });
        }

        self.belief.mark_asked(attribute);
        self.belief.record_question();
        self.belief.set_retry_pending(false);

        if !self
            .belief
            .integrate_answer(&self.kb, attribute, answer, &self.config.weights)
        {
            self.phase = SessionPhase::Failure;
            return Ok(TurnOutput::Failure {
                message: DEFEAT_MESSAGE.to_string(),
                guess: None,
                certainty: 0.0,
            });
        }

        let (guess, certainty) = self.leading_guess();
        let active = self.belief.active_count();
        let questions_asked = self.belief.questions_asked();

        if questions_asked >= self.config.min_questions {
            let confident = certainty >= self.config.certainty_threshold;
            let lone_survivor = active == 1 && certainty > self.config.lone_candidate_floor;
            if confident || lone_survivor {
                if let Some(name) = guess {
                    self.phase = SessionPhase::GuessPending;
                    return Ok(TurnOutput::MakeGuess {
                        guess: name,
                        certainty,
                    });
                }
            }
        }

        if questions_asked as usize >= self.kb.attribute_count()
            || questions_asked >= self.config.max_questions
        {
            self.phase = SessionPhase::Failure;
            return Ok(TurnOutput::Failure {
                message: DEFEAT_MESSAGE.to_string(),
                guess,
                certainty,
            });
        }

        match select_next_question(&self.kb, &mut self.belief, &self.config, &mut self.rng) {
            Some(next) => Ok(self.playing_output(next)),
            None => {
                self.phase = SessionPhase::Failure;
                Ok(TurnOutput::Failure {
                    message: DEFEAT_MESSAGE.to_string(),
                    guess,
                    certainty,
                })
            }
        }
    }

    /// The player rejected the emitted guess: demote that candidate and keep
    /// asking, with randomness pinned to zero for the retry.
    ///
    /// Does not advance the question counter.
    pub fn reject_guess(&mut self, wrong_candidate: &str) -> Result<TurnOutput, SessionError> {
        if self.phase != SessionPhase::GuessPending {
            return Err(SessionError::InvalidPhase {
                operation: "reject_guess",
                phase: self.phase,
            });
        }

        if let Some(index) = self.kb.candidate_index(wrong_candidate) {
            if !self
                .belief
                .penalize_candidate(index, self.config.weights.wrong_guess_penalty)
            {
                self.phase = SessionPhase::Failure;
                return Ok(TurnOutput::Failure {
                    message: DEFEAT_MESSAGE.to_string(),
                    guess: None,
                    certainty: 0.0,
                });
            }
        }

        self.belief.set_retry_pending(true);

        match select_next_question(&self.kb, &mut self.belief, &self.config, &mut self.rng) {
            Some(next) => {
                self.phase = SessionPhase::Playing;
                Ok(self.playing_output(next))
            }
            None => {
                self.phase = SessionPhase::Failure;
                let (guess, certainty) = self.leading_guess();
                Ok(TurnOutput::Failure {
                    message: DEFEAT_MESSAGE.to_string(),
                    guess,
                    certainty,
                })
            }
        }
    }

    /// The player accepted the emitted guess.
    pub fn confirm_guess(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::GuessPending {
            return Err(SessionError::InvalidPhase {
                operation: "confirm_guess",
                phase: self.phase,
            });
        }
        self.phase = SessionPhase::Won;
        Ok(())
    }

    fn leading_guess(&self) -> (Option<String>, f64) {
        match self.belief.leading() {
            Some((index, prob)) => (Some(self.kb.candidate_name(index).to_string()), prob),
            None => (None, 0.0),
        }
    }

    fn playing_output(&self, attribute: String) -> TurnOutput {
        TurnOutput::Playing {
            question_text: self.kb.question_text(&attribute),
            attribute_key: attribute,
            questions_asked: self.belief.questions_asked(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionError, SessionPhase, SessionSnapshot, TurnOutput};
    use crate::model::answer::Answer;
    use crate::model::knowledge::{CandidateRecord, KnowledgeBase};
    use crate::session::config::SessionConfig;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn kb(records: &[(&str, &[(&str, u8)])]) -> Arc<KnowledgeBase> {
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
        Arc::new(KnowledgeBase::from_records(records, HashMap::new()).unwrap())
    }

    fn expect_playing(output: TurnOutput) -> String {
        match output {
            TurnOutput::Playing { attribute_key, .. } => attribute_key,
            other => panic!("expected a question, got {other:?}"),
        }
    }

    #[test]
    fn start_serves_a_question_and_enters_playing() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        let attribute = expect_playing(session.start());
        assert_eq!(attribute, "tall");
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn start_fails_on_empty_catalog() {
        let kb = kb(&[("A", &[]), ("B", &[])]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        match session.start() {
            TurnOutput::Failure { guess, .. } => assert_eq!(guess, None),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.phase(), SessionPhase::Failure);
    }

    #[test]
    fn duplicate_answer_is_rejected_without_mutation() {
        let kb = kb(&[
            ("A", &[("tall", 1), ("loud", 0)]),
            ("B", &[("tall", 0), ("loud", 1)]),
        ]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        let attribute = expect_playing(session.start());
        session.answer(&attribute, Answer::Yes).unwrap();

        let before = session.snapshot();
        let err = session.answer(&attribute, Answer::No).unwrap_err();
        assert_eq!(
            err,
            SessionError::DuplicateAttribute {
                attribute: attribute.clone()
            }
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        session.start();
        let err = session.answer("hat", Answer::Yes).unwrap_err();
        assert!(matches!(err, SessionError::UnknownAttribute { .. }));
    }

    #[test]
    fn answer_outside_playing_is_an_invalid_phase() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        let err = session.answer("tall", Answer::Yes).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPhase { .. }));
    }

    #[test]
    fn confident_session_emits_a_guess() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let config = SessionConfig {
            min_questions: 1,
            weights: crate::belief::LikelihoodWeights {
                strong_mismatch: 0.1,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let mut session = Session::with_seed(kb, config, 1);
        let attribute = expect_playing(session.start());
        assert_eq!(attribute, "tall");

        match session.answer("tall", Answer::Yes).unwrap() {
            TurnOutput::MakeGuess { guess, certainty } => {
                assert_eq!(guess, "A");
                assert!(certainty >= 0.90);
            }
            other => panic!("expected a guess, got {other:?}"),
        }
        assert_eq!(session.phase(), SessionPhase::GuessPending);
    }

    #[test]
    fn rejected_guess_demotes_candidate_and_resumes_play() {
        let kb = kb(&[
            ("A", &[("x", 1), ("y", 1), ("z", 0)]),
            ("B", &[("z", 1)]),
            ("C", &[]),
        ]);
        let config = SessionConfig {
            min_questions: 2,
            weights: crate::belief::LikelihoodWeights {
                strong_mismatch: 0.1,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let mut session = Session::with_seed(kb.clone(), config, 1);
        session.start();
        session.answer("x", Answer::Yes).unwrap();
        let output = session.answer("y", Answer::Yes).unwrap();
        let guess = match output {
            TurnOutput::MakeGuess { guess, .. } => guess,
            other => panic!("expected a guess, got {other:?}"),
        };
        assert_eq!(guess, "A");

        let index = kb.candidate_index("A").unwrap();
        let before = session.belief().probability(index);
        let questions_before = session.belief().questions_asked();

        let next = session.reject_guess("A").unwrap();
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(expect_playing(next), "z");

        assert!(session.belief().probability(index) < before);
        assert!(session.belief().retry_pending());
        assert_eq!(session.belief().randomness(), 0.0);
        assert_eq!(session.belief().questions_asked(), questions_before);
    }

    #[test]
    fn confirm_guess_wins_the_session() {
        let kb = kb(&[("A", &[("tall", 1)]), ("B", &[("tall", 0)])]);
        let config = SessionConfig {
            min_questions: 1,
            weights: crate::belief::LikelihoodWeights {
                strong_mismatch: 0.1,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let mut session = Session::with_seed(kb, config, 1);
        session.start();
        session.answer("tall", Answer::Yes).unwrap();
        session.confirm_guess().unwrap();
        assert_eq!(session.phase(), SessionPhase::Won);
        assert!(session.confirm_guess().is_err());
    }

    #[test]
    fn exhausting_the_catalog_concedes_with_best_effort_guess() {
        // Candidates agree on "shared"; only "split" separates them, and it
        // cannot push anyone past the certainty threshold before the catalog
        // runs out.
        let kb = kb(&[
            ("A", &[("shared", 1), ("split", 1)]),
            ("B", &[("shared", 1), ("split", 0)]),
            ("C", &[("shared", 1), ("split", 0)]),
        ]);
        let mut session = Session::with_seed(kb, SessionConfig::default(), 1);
        session.start();
        match session.answer("shared", Answer::Yes).unwrap() {
            TurnOutput::Playing { .. } => {}
            other => panic!("expected a second question, got {other:?}"),
        }

        match session.answer("split", Answer::No).unwrap() {
            TurnOutput::Failure { guess, certainty, .. } => {
                assert_eq!(guess, Some("B".to_string()));
                assert!(certainty > 0.0);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.phase(), SessionPhase::Failure);
    }

    #[test]
    fn contradiction_ends_in_failure_without_a_guess() {
        let kb = kb(&[("A", &[("tall", 1)])]);
        let config = SessionConfig {
            weights: crate::belief::LikelihoodWeights {
                strong_mismatch: 0.0,
                ..Default::default()
            },
            ..SessionConfig::default()
        };
        let mut session = Session::with_seed(kb, config, 1);
        session.start();
        match session.answer("tall", Answer::No).unwrap() {
            TurnOutput::Failure { guess, certainty, .. } => {
                assert_eq!(guess, None);
                assert_eq!(certainty, 0.0);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.phase(), SessionPhase::Failure);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let kb = kb(&[
            ("A", &[("tall", 1), ("loud", 0)]),
            ("B", &[("tall", 0), ("loud", 1)]),
        ]);
        let mut session = Session::with_seed(kb.clone(), SessionConfig::default(), 42);
        let attribute = expect_playing(session.start());
        session.answer(&attribute, Answer::Probably).unwrap();

        let snapshot = session.snapshot();
        let json = snapshot.to_json().unwrap();
        let restored = SessionSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);

        let resumed = Session::resume(kb, SessionConfig::default(), &restored, 42);
        assert_eq!(resumed.snapshot(), snapshot);
        assert_eq!(resumed.phase(), SessionPhase::Playing);
    }

    #[test]
    fn turn_output_serializes_with_status_tag() {
        let output = TurnOutput::MakeGuess {
            guess: "A".to_string(),
            certainty: 0.95,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "make_guess");
        assert_eq!(json["guess"], "A");

        let err = SessionError::DuplicateAttribute {
            attribute: "tall".to_string(),
        };
        assert_eq!(err.to_json()["status"], "error");
    }
}
