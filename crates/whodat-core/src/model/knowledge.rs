//! Immutable candidate set, attribute catalog, and question-text rendering.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One candidate as supplied by the external loader.
///
/// Attribute values are strictly 0 or 1; keys absent from the map read as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, u8>,
}

/// Construction-time validation failures. Fatal: no session can start on a
/// knowledge base that failed to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyCandidateSet,
    DuplicateCandidate { name: String },
    InvalidAttributeValue {
        candidate: String,
        attribute: String,
        value: u8,
    },
    Malformed { detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyCandidateSet => write!(f, "knowledge base has no candidates"),
            ConfigError::DuplicateCandidate { name } => {
                write!(f, "duplicate candidate name {name:?}")
            }
            ConfigError::InvalidAttributeValue {
                candidate,
                attribute,
                value,
            } => write!(
                f,
                "candidate {candidate:?} has non-binary value {value} for attribute {attribute:?}"
            ),
            ConfigError::Malformed { detail } => write!(f, "malformed knowledge base: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read-only candidate set shared by every session.
///
/// The attribute catalog is kept sorted lexicographically; every iteration
/// the engine performs over attributes follows this order, which is what makes
/// information-gain tie-breaking reproducible.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    candidates: Vec<CandidateRecord>,
    by_name: HashMap<String, usize>,
    attributes: Vec<String>,
    questions: HashMap<String, String>,
}

impl KnowledgeBase {
    /// Validates and indexes the loader-supplied records and question bank.
    pub fn from_records(
        records: Vec<CandidateRecord>,
        questions: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        if records.is_empty() {
            return Err(ConfigError::EmptyCandidateSet);
        }

        let mut by_name = HashMap::with_capacity(records.len());
        let mut catalog = BTreeSet::new();
        for (index, record) in records.iter().enumerate() {
            if by_name.insert(record.name.clone(), index).is_some() {
                return Err(ConfigError::DuplicateCandidate {
                    name: record.name.clone(),
                });
            }
            for (attribute, &value) in &record.attributes {
                if value > 1 {
                    return Err(ConfigError::InvalidAttributeValue {
                        candidate: record.name.clone(),
                        attribute: attribute.clone(),
                        value,
                    });
                }
                catalog.insert(attribute.clone());
            }
        }

        Ok(Self {
            candidates: records,
            by_name,
            attributes: catalog.into_iter().collect(),
            questions,
        })
    }

    /// Builds a knowledge base from the JSON file formats the original data
    /// ships in: a record array and an attribute→question map.
    pub fn from_json(candidates_json: &str, questions_json: &str) -> Result<Self, ConfigError> {
        let records: Vec<CandidateRecord> =
            serde_json::from_str(candidates_json).map_err(|err| ConfigError::Malformed {
                detail: format!("candidate records: {err}"),
            })?;
        let questions: HashMap<String, String> =
            serde_json::from_str(questions_json).map_err(|err| ConfigError::Malformed {
                detail: format!("question bank: {err}"),
            })?;
        Self::from_records(records, questions)
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate_name(&self, index: usize) -> &str {
        &self.candidates[index].name
    }

    pub fn candidate_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Attribute value for one candidate; unspecified attributes read as 0.
    pub fn attribute_value(&self, candidate: usize, attribute: &str) -> u8 {
        self.candidates[candidate]
            .attributes
            .get(attribute)
            .copied()
            .unwrap_or(0)
    }

    /// The full catalog, sorted lexicographically.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn contains_attribute(&self, attribute: &str) -> bool {
        self.attributes.binary_search_by(|key| key.as_str().cmp(attribute)).is_ok()
    }

    /// Display text for an attribute's question.
    ///
    /// `nickname_<value>` keys get the dedicated nickname phrasing (skipped for
    /// the literal placeholder "None"); everything else uses the question bank,
    /// falling back to a phrasing generated from the key.
    pub fn question_text(&self, attribute: &str) -> String {
        if let Some(raw) = attribute.strip_prefix("nickname_") {
            let nickname = raw.replace('_', " ");
            if nickname != "None" {
                return format!("Is the person's nickname {nickname}?");
            }
        }

        self.questions
            .get(attribute)
            .cloned()
            .unwrap_or_else(|| format!("Is the person {}?", attribute.replace('_', " ")))
    }
}
