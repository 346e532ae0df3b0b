#![deny(warnings)]
//! Sequential-questioning identification engine.
//!
//! Given a fixed knowledge base of candidates described by binary attributes,
//! the engine narrows a per-session probability distribution by asking, each
//! turn, the attribute whose answer is expected to be most discriminating,
//! folding in crisp or noisy answers, and deciding when to guess, retry after
//! a wrong guess, or concede.
//!
//! The engine performs no I/O: loading the knowledge base, persisting
//! sessions, and talking to players are hosting-layer concerns.

pub mod belief;
pub mod model;
pub mod session;

pub use belief::{BeliefState, LikelihoodWeights, MASS_EPSILON};
pub use model::{Answer, CandidateRecord, ConfigError, KnowledgeBase, ParseAnswerError};
pub use session::{
    Session, SessionConfig, SessionError, SessionPhase, SessionSnapshot, TurnOutput,
};
