use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::model::ids::ChallengeId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("grade out of range: {0}")]
    GradeOutOfRange(i64),

    #[error("challenge config must be a JSON object")]
    ConfigNotObject,

    #[error("invalid challenge config value for `{0}`")]
    InvalidConfigField(&'static str),
}

/// A context field that was absent or unusable and was replaced by a default.
///
/// Never fatal: the session still runs with the defaulted context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextMissing {
    #[error("challenge_id is missing")]
    ChallengeId,
    #[error("grade is missing")]
    Grade,
    #[error("subject is missing")]
    Subject,
    #[error(transparent)]
    Invalid(#[from] ContextError),
}

//
// ─── SUBJECT ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    #[default]
    Mathematics,
    Science,
    Technology,
    Engineering,
}

impl Subject {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Mathematics => "mathematics",
            Subject::Science => "science",
            Subject::Technology => "technology",
            Subject::Engineering => "engineering",
        }
    }

    /// Parse a subject name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::UnknownSubject` for anything outside the four subjects.
    pub fn parse(raw: &str) -> Result<Self, ContextError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mathematics" | "math" | "maths" => Ok(Self::Mathematics),
            "science" => Ok(Self::Science),
            "technology" => Ok(Self::Technology),
            "engineering" => Ok(Self::Engineering),
            _ => Err(ContextError::UnknownSubject(raw.to_owned())),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CONTEXT ──────────────────────────────────────────────────────────────────
//

/// Loosely typed challenge parameters as handed over by the hosting page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChallengeDraft {
    pub challenge_id: Option<String>,
    pub grade: Option<i64>,
    pub subject: Option<String>,
    pub config: Option<Value>,
}

/// Parameters identifying which content, grade and subject a session plays.
///
/// Immutable once built; sessions only ever read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeContext {
    challenge_id: ChallengeId,
    grade: u8,
    subject: Subject,
    config: Option<Value>,
}

impl ChallengeContext {
    pub const MIN_GRADE: u8 = 1;
    pub const MAX_GRADE: u8 = 12;

    #[must_use]
    pub fn new(challenge_id: ChallengeId, grade: u8, subject: Subject) -> Self {
        Self {
            challenge_id,
            grade: grade.clamp(Self::MIN_GRADE, Self::MAX_GRADE),
            subject,
            config: None,
        }
    }

    /// Attach a per-challenge configuration object.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Build a context from a draft, defaulting every absent or invalid field.
    ///
    /// The second element lists what was defaulted so callers can surface it.
    #[must_use]
    pub fn resolve(draft: ChallengeDraft) -> (Self, Vec<ContextMissing>) {
        let mut missing = Vec::new();

        let challenge_id = match draft.challenge_id.as_deref().map(str::parse::<ChallengeId>) {
            Some(Ok(id)) => id,
            _ => {
                missing.push(ContextMissing::ChallengeId);
                ChallengeId::practice()
            }
        };

        let grade = match draft.grade {
            None => {
                missing.push(ContextMissing::Grade);
                Self::MIN_GRADE
            }
            Some(raw) => match u8::try_from(raw) {
                Ok(g) if (Self::MIN_GRADE..=Self::MAX_GRADE).contains(&g) => g,
                _ => {
                    missing.push(ContextError::GradeOutOfRange(raw).into());
                    Self::MIN_GRADE
                }
            },
        };

        let subject = match draft.subject.as_deref() {
            None => {
                missing.push(ContextMissing::Subject);
                Subject::default()
            }
            Some(raw) => Subject::parse(raw).unwrap_or_else(|err| {
                missing.push(err.into());
                Subject::default()
            }),
        };

        let config = match draft.config {
            Some(Value::Object(map)) => Some(Value::Object(map)),
            Some(Value::Null) | None => None,
            Some(_) => {
                missing.push(ContextError::ConfigNotObject.into());
                None
            }
        };

        (
            Self {
                challenge_id,
                grade,
                subject,
                config,
            },
            missing,
        )
    }

    #[must_use]
    pub fn challenge_id(&self) -> &ChallengeId {
        &self.challenge_id
    }

    #[must_use]
    pub fn grade(&self) -> u8 {
        self.grade
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn config(&self) -> Option<&Value> {
        self.config.as_ref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
