//! Question generators: pure functions from a round index and a randomness source to a `Round`.

pub mod arithmetic;
pub mod elements;
pub mod options;
pub mod sequence;

use rand::Rng;

use crate::model::{Prompt, Round, RoundError};

pub use options::{OptionSpread, perturbed_options};
pub use sequence::SequencePattern;

/// The generator family a game draws its rounds from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Arithmetic,
    Sequence,
    ElementLookup,
    /// A single "enter 1" round used by games that are not built yet.
    Confirm,
}

impl Generator {
    /// Produce the round for `round_index`.
    ///
    /// # Errors
    ///
    /// Returns `RoundError` if a generated option set breaks round invariants.
    pub fn generate<R: Rng + ?Sized>(self, round_index: u32, rng: &mut R) -> Result<Round, RoundError> {
        match self {
            Generator::Arithmetic => Ok(arithmetic::generate(rng)),
            Generator::Sequence => sequence::generate(round_index, rng),
            Generator::ElementLookup => elements::generate(rng),
            Generator::Confirm => Ok(Round::numeric_entry(Prompt::Confirm, 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OPTION_COUNT;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn option_based_generators_always_offer_four_with_one_correct() {
        let mut rng = StdRng::seed_from_u64(2024);
        for generator in [Generator::Sequence, Generator::ElementLookup] {
            for round_index in 0..100 {
                let round = generator.generate(round_index, &mut rng).unwrap();
                assert_eq!(round.options().len(), OPTION_COUNT);
                assert_eq!(
                    round
                        .options()
                        .iter()
                        .filter(|&&o| o == round.correct())
                        .count(),
                    1
                );
            }
        }
    }

    #[test]
    fn confirm_round_expects_one() {
        let mut rng = StdRng::seed_from_u64(0);
        let round = Generator::Confirm.generate(0, &mut rng).unwrap();
        assert_eq!(round.correct(), 1);
        assert_eq!(round.prompt(), &Prompt::Confirm);
    }
}
