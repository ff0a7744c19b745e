use rand::Rng;

use super::options::{OptionSpread, perturbed_options};
use crate::model::{Prompt, Round, RoundError};

/// Number of sequence archetypes; rounds cycle through them in order.
pub const ARCHETYPE_COUNT: u32 = 5;

const DISTRACTOR_SPREAD: i64 = 5;

/// A number pattern from which four visible terms and the next term are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePattern {
    /// `start + k * step`
    Arithmetic { start: i64, step: i64 },
    /// `start * ratio^k`
    Geometric { start: i64, ratio: i64 },
    /// Each gap grows by `step`: `a(k+1) = a(k) + step * (k + 1)`.
    GrowingGaps { start: i64, step: i64 },
    /// `(start + k)^2`
    Squares { start: i64 },
    /// `a(k+2) = a(k+1) + a(k)`
    Fibonacci { first: i64, second: i64 },
}

impl SequencePattern {
    /// Archetype slot used for a round.
    #[must_use]
    pub fn archetype(round_index: u32) -> u32 {
        round_index % ARCHETYPE_COUNT
    }

    /// Draw parameters for the archetype selected by `round_index`.
    pub fn sample<R: Rng + ?Sized>(round_index: u32, rng: &mut R) -> Self {
        match Self::archetype(round_index) {
            0 => Self::Arithmetic {
                start: rng.random_range(1..=10),
                step: rng.random_range(2..=5),
            },
            1 => Self::Geometric {
                start: rng.random_range(1..=3),
                ratio: rng.random_range(2..=3),
            },
            2 => Self::GrowingGaps {
                start: rng.random_range(1..=5),
                step: rng.random_range(1..=3),
            },
            3 => Self::Squares {
                start: rng.random_range(1..=6),
            },
            _ => Self::Fibonacci {
                first: rng.random_range(1..=3),
                second: rng.random_range(1..=4),
            },
        }
    }

    /// The first five terms: four visible ones followed by the answer.
    #[must_use]
    pub fn terms(self) -> [i64; 5] {
        let mut terms = [0_i64; 5];
        match self {
            Self::Arithmetic { start, step } => {
                for (k, term) in (0_i64..).zip(terms.iter_mut()) {
                    *term = start + k * step;
                }
            }
            Self::Geometric { start, ratio } => {
                let mut value = start;
                for term in &mut terms {
                    *term = value;
                    value *= ratio;
                }
            }
            Self::GrowingGaps { start, step } => {
                let mut value = start;
                for (k, term) in (1_i64..).zip(terms.iter_mut()) {
                    *term = value;
                    value += step * k;
                }
            }
            Self::Squares { start } => {
                for (k, term) in (0_i64..).zip(terms.iter_mut()) {
                    *term = (start + k) * (start + k);
                }
            }
            Self::Fibonacci { first, second } => {
                terms[0] = first;
                terms[1] = second;
                for k in 2..terms.len() {
                    terms[k] = terms[k - 1] + terms[k - 2];
                }
            }
        }
        terms
    }

    #[must_use]
    pub fn visible(self) -> [i64; 4] {
        let [a, b, c, d, _] = self.terms();
        [a, b, c, d]
    }

    #[must_use]
    pub fn next_value(self) -> i64 {
        self.terms()[4]
    }
}

/// Build a multiple-choice round asking for the term after the visible four.
///
/// # Errors
///
/// Propagates `RoundError` if the option set violates round invariants.
pub fn pattern_round<R: Rng + ?Sized>(
    pattern: SequencePattern,
    rng: &mut R,
) -> Result<Round, RoundError> {
    let correct = pattern.next_value();
    let options = perturbed_options(correct, OptionSpread::new(DISTRACTOR_SPREAD), rng);
    Round::multiple_choice(
        Prompt::Sequence {
            visible: pattern.visible(),
        },
        correct,
        options,
    )
}

/// # Errors
///
/// Propagates `RoundError` if the option set violates round invariants.
pub fn generate<R: Rng + ?Sized>(round_index: u32, rng: &mut R) -> Result<Round, RoundError> {
    let pattern = SequencePattern::sample(round_index, rng);
    pattern_round(pattern, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn arithmetic_progression_from_two_by_three() {
        let pattern = SequencePattern::Arithmetic { start: 2, step: 3 };
        assert_eq!(pattern.visible(), [2, 5, 8, 11]);
        assert_eq!(pattern.next_value(), 14);
    }

    #[test]
    fn each_archetype_produces_expected_terms() {
        assert_eq!(
            SequencePattern::Geometric { start: 3, ratio: 2 }.terms(),
            [3, 6, 12, 24, 48]
        );
        assert_eq!(
            SequencePattern::GrowingGaps { start: 1, step: 2 }.terms(),
            [1, 3, 7, 13, 21]
        );
        assert_eq!(
            SequencePattern::Squares { start: 2 }.terms(),
            [4, 9, 16, 25, 36]
        );
        assert_eq!(
            SequencePattern::Fibonacci { first: 1, second: 2 }.terms(),
            [1, 2, 3, 5, 8]
        );
    }

    #[test]
    fn archetype_cycles_with_round_index() {
        let mut rng = StdRng::seed_from_u64(5);
        for round in 0..10 {
            let pattern = SequencePattern::sample(round, &mut rng);
            let expected = match round % 5 {
                0 => matches!(pattern, SequencePattern::Arithmetic { .. }),
                1 => matches!(pattern, SequencePattern::Geometric { .. }),
                2 => matches!(pattern, SequencePattern::GrowingGaps { .. }),
                3 => matches!(pattern, SequencePattern::Squares { .. }),
                _ => matches!(pattern, SequencePattern::Fibonacci { .. }),
            };
            assert!(expected, "round {round} drew {pattern:?}");
        }
    }

    #[test]
    fn pattern_round_offers_the_next_term() {
        let mut rng = StdRng::seed_from_u64(1);
        let round =
            pattern_round(SequencePattern::Arithmetic { start: 2, step: 3 }, &mut rng).unwrap();

        assert_eq!(round.correct(), 14);
        assert_eq!(
            round.prompt(),
            &Prompt::Sequence {
                visible: [2, 5, 8, 11]
            }
        );
        assert_eq!(round.options().len(), 4);
        assert_eq!(round.options().iter().filter(|&&o| o == 14).count(), 1);
    }
}
