use rand::Rng;

use super::options::{OptionSpread, perturbed_options};
use crate::model::{Prompt, Round, RoundError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub number: i64,
    pub symbol: &'static str,
    pub name: &'static str,
}

const fn element(number: i64, symbol: &'static str, name: &'static str) -> Element {
    Element {
        number,
        symbol,
        name,
    }
}

/// Reference table for the element matching game.
pub const ELEMENTS: [Element; 20] = [
    element(1, "H", "Hydrogen"),
    element(2, "He", "Helium"),
    element(3, "Li", "Lithium"),
    element(4, "Be", "Beryllium"),
    element(5, "B", "Boron"),
    element(6, "C", "Carbon"),
    element(7, "N", "Nitrogen"),
    element(8, "O", "Oxygen"),
    element(9, "F", "Fluorine"),
    element(10, "Ne", "Neon"),
    element(11, "Na", "Sodium"),
    element(12, "Mg", "Magnesium"),
    element(13, "Al", "Aluminium"),
    element(14, "Si", "Silicon"),
    element(15, "P", "Phosphorus"),
    element(16, "S", "Sulfur"),
    element(17, "Cl", "Chlorine"),
    element(18, "Ar", "Argon"),
    element(19, "K", "Potassium"),
    element(20, "Ca", "Calcium"),
];

const DISTRACTOR_SPREAD: i64 = 4;

/// Build a round asking for the atomic number of `entry`.
///
/// # Errors
///
/// Propagates `RoundError` if the option set violates round invariants.
pub fn element_round<R: Rng + ?Sized>(entry: Element, rng: &mut R) -> Result<Round, RoundError> {
    let spread = OptionSpread::new(DISTRACTOR_SPREAD).with_floor(1);
    let options = perturbed_options(entry.number, spread, rng);
    Round::multiple_choice(
        Prompt::Element {
            symbol: entry.symbol,
            name: entry.name,
        },
        entry.number,
        options,
    )
}

/// # Errors
///
/// Propagates `RoundError` if the option set violates round invariants.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Result<Round, RoundError> {
    let entry = ELEMENTS[rng.random_range(0..ELEMENTS.len())];
    element_round(entry, rng)
}
