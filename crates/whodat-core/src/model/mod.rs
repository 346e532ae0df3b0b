pub mod answer;
pub mod knowledge;

pub use answer::{Answer, ParseAnswerError};
pub use knowledge::{CandidateRecord, ConfigError, KnowledgeBase};
