use chrono::NaiveDate;
use serde_json::Value;

use crate::model::challenge::{ChallengeContext, Subject};
use crate::model::game::GameKind;
use crate::model::ids::ChallengeId;

/// A challenge published for a given day and grade.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyChallenge {
    pub challenge_id: ChallengeId,
    pub date: NaiveDate,
    pub game: GameKind,
    pub grade: u8,
    pub subject: Subject,
    pub config: Option<Value>,
}

impl DailyChallenge {
    /// Context a session should be started with for this challenge.
    #[must_use]
    pub fn context(&self) -> ChallengeContext {
        let ctx = ChallengeContext::new(self.challenge_id.clone(), self.grade, self.subject);
        match &self.config {
            Some(config) => ctx.with_config(config.clone()),
            None => ctx,
        }
    }
}
