use rand::Rng;

use crate::model::{Operator, Prompt, Round};

/// One single-digit addition or subtraction, answered by typing the result.
///
/// Subtraction operands are ordered so the answer is never negative.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Round {
    let op = if rng.random_bool(0.5) {
        Operator::Add
    } else {
        Operator::Subtract
    };
    let a: i64 = rng.random_range(0..=9);
    let b: i64 = rng.random_range(0..=9);
    let (lhs, rhs) = match op {
        Operator::Subtract if a < b => (b, a),
        _ => (a, b),
    };

    Round::numeric_entry(Prompt::Arithmetic { lhs, op, rhs }, op.apply(lhs, rhs))
}
