use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Number of options every multiple-choice round offers.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoundError {
    #[error("expected {expected} options, got {actual}")]
    OptionCount { expected: usize, actual: usize },

    #[error("correct answer {0} must appear exactly once among the options")]
    CorrectNotUnique(i64),

    #[error("duplicate option value: {0}")]
    DuplicateOption(i64),
}

//
// ─── PROMPT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }

    #[must_use]
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
        }
    }
}

/// What the player is shown for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Prompt {
    Arithmetic { lhs: i64, op: Operator, rhs: i64 },
    Sequence { visible: [i64; 4] },
    Element { symbol: &'static str, name: &'static str },
    Confirm,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Arithmetic { lhs, op, rhs } => write!(f, "{lhs} {} {rhs} = ?", op.symbol()),
            Prompt::Sequence { visible } => {
                for term in visible {
                    write!(f, "{term}, ")?;
                }
                f.write_str("?")
            }
            Prompt::Element { symbol, name } => {
                write!(f, "What is the atomic number of {name} ({symbol})?")
            }
            Prompt::Confirm => f.write_str("This game is on its way. Enter 1 to finish."),
        }
    }
}

//
// ─── ROUND ────────────────────────────────────────────────────────────────────
//

/// One generated question: prompt, correct answer and (for multiple choice) the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    prompt: Prompt,
    correct: i64,
    options: Vec<i64>,
}

impl Round {
    /// A round answered by typing a number; it carries no option set.
    #[must_use]
    pub fn numeric_entry(prompt: Prompt, correct: i64) -> Self {
        Self {
            prompt,
            correct,
            options: Vec::new(),
        }
    }

    /// A multiple-choice round.
    ///
    /// # Errors
    ///
    /// Returns `RoundError` unless there are exactly `OPTION_COUNT` pairwise distinct
    /// options containing `correct` exactly once.
    pub fn multiple_choice(
        prompt: Prompt,
        correct: i64,
        options: Vec<i64>,
    ) -> Result<Self, RoundError> {
        if options.len() != OPTION_COUNT {
            return Err(RoundError::OptionCount {
                expected: OPTION_COUNT,
                actual: options.len(),
            });
        }
        if options.iter().filter(|&&o| o == correct).count() != 1 {
            return Err(RoundError::CorrectNotUnique(correct));
        }
        let mut seen = HashSet::with_capacity(options.len());
        if let Some(dup) = options.iter().find(|o| !seen.insert(**o)) {
            return Err(RoundError::DuplicateOption(*dup));
        }

        Ok(Self {
            prompt,
            correct,
            options,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    #[must_use]
    pub fn correct(&self) -> i64 {
        self.correct
    }

    #[must_use]
    pub fn options(&self) -> &[i64] {
        &self.options
    }

    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        !self.options.is_empty()
    }

    #[must_use]
    pub fn is_correct(&self, answer: i64) -> bool {
        answer == self.correct
    }

    /// Position of the correct option, if this is a multiple-choice round.
    #[must_use]
    pub fn correct_slot(&self) -> Option<usize> {
        self.options.iter().position(|&o| o == self.correct)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_prompt() -> Prompt {
        Prompt::Sequence {
            visible: [2, 5, 8, 11],
        }
    }

    #[test]
    fn multiple_choice_accepts_valid_options() {
        let round = Round::multiple_choice(seq_prompt(), 14, vec![12, 14, 17, 9]).unwrap();
        assert_eq!(round.correct_slot(), Some(1));
        assert!(round.is_multiple_choice());
        assert!(round.is_correct(14));
        assert!(!round.is_correct(12));
    }

    #[test]
    fn multiple_choice_rejects_wrong_count() {
        let err = Round::multiple_choice(seq_prompt(), 14, vec![14, 15, 16]).unwrap_err();
        assert_eq!(
            err,
            RoundError::OptionCount {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn multiple_choice_rejects_missing_or_repeated_correct() {
        let missing = Round::multiple_choice(seq_prompt(), 14, vec![1, 2, 3, 4]).unwrap_err();
        assert_eq!(missing, RoundError::CorrectNotUnique(14));

        let repeated = Round::multiple_choice(seq_prompt(), 14, vec![14, 14, 3, 4]).unwrap_err();
        assert_eq!(repeated, RoundError::CorrectNotUnique(14));
    }

    #[test]
    fn multiple_choice_rejects_duplicate_distractors() {
        let err = Round::multiple_choice(seq_prompt(), 14, vec![14, 3, 3, 4]).unwrap_err();
        assert_eq!(err, RoundError::DuplicateOption(3));
    }

    #[test]
    fn prompts_render_for_players() {
        let arith = Prompt::Arithmetic {
            lhs: 7,
            op: Operator::Subtract,
            rhs: 3,
        };
        assert_eq!(arith.to_string(), "7 - 3 = ?");
        assert_eq!(seq_prompt().to_string(), "2, 5, 8, 11, ?");
    }
}
