mod attempt;
mod challenge;
mod game;
mod ids;
mod round;
mod schedule;

pub use ids::{AttemptId, ChallengeId, ParseIdError, UserId};

pub use attempt::{AttemptError, AttemptMeta, AttemptRecord, AttemptResult, AttemptSubmission};
pub use challenge::{ChallengeContext, ChallengeDraft, ContextError, ContextMissing, Subject};
pub use game::GameKind;
pub use round::{OPTION_COUNT, Operator, Prompt, Round, RoundError};
pub use schedule::DailyChallenge;
