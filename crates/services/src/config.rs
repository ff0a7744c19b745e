use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use arcade_core::model::{ChallengeContext, ContextError, ContextMissing};

/// Per-session overrides read from `ChallengeContext::config`.
///
/// Every field is optional; `None` means "use the game's default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameConfig {
    pub rounds: Option<u32>,
    pub time_limit_secs: Option<u32>,
    pub feedback_delay_ms: Option<u64>,
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Read overrides from the context, dropping unusable values.
    ///
    /// The second element lists the fields that were ignored.
    #[must_use]
    pub fn from_context(context: &ChallengeContext) -> (Self, Vec<ContextMissing>) {
        match context.config() {
            None => (Self::default(), Vec::new()),
            Some(Value::Object(map)) => Self::from_map(map),
            Some(_) => (
                Self::default(),
                vec![ContextError::ConfigNotObject.into()],
            ),
        }
    }

    fn from_map(map: &Map<String, Value>) -> (Self, Vec<ContextMissing>) {
        let mut ignored = Vec::new();
        let config = Self {
            rounds: positive(map, "rounds", &mut ignored),
            time_limit_secs: positive(map, "time_limit_secs", &mut ignored),
            feedback_delay_ms: field(map, "feedback_delay_ms", &mut ignored),
            seed: field(map, "seed", &mut ignored),
        };
        (config, ignored)
    }
}

fn field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    name: &'static str,
    ignored: &mut Vec<ContextMissing>,
) -> Option<T> {
    let raw = map.get(name)?;
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Some(value),
        Err(_) => {
            ignored.push(ContextError::InvalidConfigField(name).into());
            None
        }
    }
}

fn positive(
    map: &Map<String, Value>,
    name: &'static str,
    ignored: &mut Vec<ContextMissing>,
) -> Option<u32> {
    match field::<u32>(map, name, ignored)? {
        0 => {
            ignored.push(ContextError::InvalidConfigField(name).into());
            None
        }
        value => Some(value),
    }
}
