use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of mini-games a challenge can declare.
///
/// `Placeholder` is the fallback arm for identifiers this build does not know;
/// it still runs a full session so the recording path can be exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// Single-digit addition and subtraction, typed answers.
    QuickMath,
    /// "What comes next?" number sequences, multiple choice.
    SequenceSolver,
    /// Match elements to atomic numbers against the clock.
    ElementRush,
    Placeholder,
}

impl GameKind {
    pub const PLAYABLE: [GameKind; 3] = [
        GameKind::QuickMath,
        GameKind::SequenceSolver,
        GameKind::ElementRush,
    ];

    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            GameKind::QuickMath => "quick-math",
            GameKind::SequenceSolver => "sequence-solver",
            GameKind::ElementRush => "element-rush",
            GameKind::Placeholder => "placeholder",
        }
    }

    /// Look up a game by its declared identifier. Returns `None` for unknown identifiers.
    #[must_use]
    pub fn from_identifier(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "quick-math" => Some(GameKind::QuickMath),
            "sequence-solver" => Some(GameKind::SequenceSolver),
            "element-rush" => Some(GameKind::ElementRush),
            "placeholder" => Some(GameKind::Placeholder),
            _ => None,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            GameKind::QuickMath => "Quick Math",
            GameKind::SequenceSolver => "Sequence Solver",
            GameKind::ElementRush => "Element Rush",
            GameKind::Placeholder => "Coming Soon",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
