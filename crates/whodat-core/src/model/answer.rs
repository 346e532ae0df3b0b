use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A player's response to one yes/no question.
///
/// Crisp answers carry full likelihood weight; the "probably" pair is the
/// mistake-tolerant middle ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    Probably,
    ProbablyNot,
}

impl Answer {
    /// Numeric likelihood value compared against the candidate's 0/1 attribute.
    pub const fn value(self) -> f64 {
        match self {
            Answer::Yes => 1.0,
            Answer::No => 0.0,
            Answer::Probably => 0.75,
            Answer::ProbablyNot => 0.25,
        }
    }

    /// Inverse of [`Answer::value`]; rejects anything outside the four levels.
    pub fn from_value(value: f64) -> Option<Self> {
        match value {
            v if v == 1.0 => Some(Answer::Yes),
            v if v == 0.0 => Some(Answer::No),
            v if v == 0.75 => Some(Answer::Probably),
            v if v == 0.25 => Some(Answer::ProbablyNot),
            _ => None,
        }
    }

    pub const fn is_crisp(self) -> bool {
        matches!(self, Answer::Yes | Answer::No)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Probably => "probably",
            Answer::ProbablyNot => "probably not",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAnswerError {
    input: String,
}

impl fmt::Display for ParseAnswerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized answer {:?} (expected yes/no/probably/probably not)",
            self.input
        )
    }
}

impl std::error::Error for ParseAnswerError {}

impl FromStr for Answer {
    type Err = ParseAnswerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Answer::Yes),
            "no" | "n" => Ok(Answer::No),
            "probably" | "p" => Ok(Answer::Probably),
            "probably not" | "probably_not" | "pn" => Ok(Answer::ProbablyNot),
            _ => Err(ParseAnswerError {
                input: raw.to_string(),
            }),
        }
    }
}
