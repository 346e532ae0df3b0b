//! Turn-by-turn session orchestration.
//!
//! - `config`: policy constants (thresholds, question budgets, multipliers).
//! - `selector`: the focused/general/fallback question-selection cascade.
//! - `controller`: the session state machine and its turn outputs.

pub mod config;
pub mod controller;
mod selector;

pub use config::SessionConfig;
pub use controller::{Session, SessionError, SessionPhase, SessionSnapshot, TurnOutput};
