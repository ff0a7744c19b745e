use std::collections::HashSet;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::OPTION_COUNT;

/// Consecutive non-novel draws tolerated before the spread is doubled.
const STALL_LIMIT: u32 = 24;
/// Doublings allowed before falling back to a deterministic fill.
const MAX_WIDENINGS: u32 = 6;

/// Sampling window for distractors around the correct value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpread {
    /// Largest initial offset magnitude (offsets are drawn from `±1..=initial`).
    pub initial: i64,
    /// Smallest value a distractor may take.
    pub floor: Option<i64>,
}

impl OptionSpread {
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            initial: initial.max(1),
            floor: None,
        }
    }

    #[must_use]
    pub fn with_floor(mut self, floor: i64) -> Self {
        self.floor = Some(floor);
        self
    }

    fn admits(&self, value: i64) -> bool {
        self.floor.is_none_or(|floor| value >= floor)
    }
}

/// Build a shuffled option set of `OPTION_COUNT` distinct values containing `correct` once.
///
/// Distractors are `correct + offset` for random non-zero offsets. When draws keep
/// colliding the window is doubled; once widening is exhausted the remaining slots are
/// filled with `correct ± 1, ± 2, ...` so the call always returns.
pub fn perturbed_options<R: Rng + ?Sized>(correct: i64, spread: OptionSpread, rng: &mut R) -> Vec<i64> {
    let mut seen = HashSet::from([correct]);
    let mut options = Vec::with_capacity(OPTION_COUNT);
    options.push(correct);

    let mut window = spread.initial.max(1);
    let mut stalled = 0_u32;
    let mut widenings = 0_u32;

    while options.len() < OPTION_COUNT {
        if stalled >= STALL_LIMIT {
            if widenings >= MAX_WIDENINGS {
                fill_nearest(correct, &spread, &mut seen, &mut options);
                break;
            }
            window = window.saturating_mul(2);
            widenings += 1;
            stalled = 0;
            debug!("option spread around {correct} widened to ±{window}");
        }

        let magnitude = rng.random_range(1..=window);
        let offset = if rng.random_bool(0.5) { magnitude } else { -magnitude };
        let candidate = correct.saturating_add(offset);

        if spread.admits(candidate) && seen.insert(candidate) {
            options.push(candidate);
            stalled = 0;
        } else {
            stalled += 1;
        }
    }

    options.shuffle(rng);
    options
}

fn fill_nearest(correct: i64, spread: &OptionSpread, seen: &mut HashSet<i64>, options: &mut Vec<i64>) {
    let mut step = 1_i64;
    while options.len() < OPTION_COUNT {
        for candidate in [correct.saturating_add(step), correct.saturating_sub(step)] {
            if options.len() < OPTION_COUNT && spread.admits(candidate) && seen.insert(candidate) {
                options.push(candidate);
            }
        }
        step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// An RNG that always yields zero bits, so every draw collides.
    struct StuckRng;

    impl RngCore for StuckRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn assert_valid(options: &[i64], correct: i64) {
        assert_eq!(options.len(), OPTION_COUNT);
        assert_eq!(options.iter().filter(|&&o| o == correct).count(), 1);
        let unique: HashSet<_> = options.iter().collect();
        assert_eq!(unique.len(), OPTION_COUNT);
    }

    #[test]
    fn options_are_distinct_and_contain_correct_once() {
        let mut rng = StdRng::seed_from_u64(7);
        for correct in [-3, 0, 1, 14, 250] {
            for _ in 0..50 {
                let options = perturbed_options(correct, OptionSpread::new(5), &mut rng);
                assert_valid(&options, correct);
            }
        }
    }

    #[test]
    fn floor_is_respected() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let options = perturbed_options(1, OptionSpread::new(4).with_floor(1), &mut rng);
            assert_valid(&options, 1);
            assert!(options.iter().all(|&o| o >= 1));
        }
    }

    #[test]
    fn narrow_window_widens_instead_of_looping() {
        let mut rng = StdRng::seed_from_u64(3);
        let options = perturbed_options(1, OptionSpread::new(1).with_floor(1), &mut rng);
        assert_valid(&options, 1);
    }

    #[test]
    fn stuck_rng_still_terminates() {
        let options = perturbed_options(10, OptionSpread::new(2), &mut StuckRng);
        assert_valid(&options, 10);
    }

    #[test]
    fn correct_slot_is_not_biased() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut slots = [0_u32; OPTION_COUNT];
        for _ in 0..4_000 {
            let options = perturbed_options(20, OptionSpread::new(5), &mut rng);
            let slot = options.iter().position(|&o| o == 20).unwrap();
            slots[slot] += 1;
        }
        for count in slots {
            assert!((800..=1_200).contains(&count), "slot distribution skewed: {slots:?}");
        }
    }
}
