//! Point deltas per answer and the final score of a session.

/// How a game turns answers into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// One point per hit, nothing for a miss; final score is the hit percentage.
    HitCounter,
    /// Running score: `reward` per hit, `penalty` subtracted per miss, never below `floor`.
    RunningScore { reward: i64, penalty: i64, floor: i64 },
}

impl ScoringPolicy {
    /// +10 per hit, -5 per miss, clamped at zero.
    pub const ARCADE: Self = Self::RunningScore {
        reward: 10,
        penalty: 5,
        floor: 0,
    };

    /// Point delta for one answer. Misses are never positive.
    #[must_use]
    pub fn delta(self, is_correct: bool) -> i64 {
        match (self, is_correct) {
            (Self::HitCounter, true) => 1,
            (Self::HitCounter, false) => 0,
            (Self::RunningScore { reward, .. }, true) => reward,
            (Self::RunningScore { penalty, .. }, false) => -penalty.abs(),
        }
    }

    /// Apply one answer to a running point total.
    #[must_use]
    pub fn apply(self, points: i64, is_correct: bool) -> i64 {
        let next = points.saturating_add(self.delta(is_correct));
        match self {
            Self::HitCounter => next,
            Self::RunningScore { floor, .. } => next.max(floor),
        }
    }

    /// Score reported for a finished session.
    ///
    /// Hit counters report `percentage(hits, total)`; running scores report their
    /// raw point total clamped into `0..=100`.
    #[must_use]
    pub fn final_score(self, hits: u32, total: u32, points: i64) -> u8 {
        match self {
            Self::HitCounter => percentage(hits, total),
            Self::RunningScore { .. } => u8::try_from(points.clamp(0, 100)).unwrap_or(100),
        }
    }

    /// Points credited to the player's ledger for a finished session.
    #[must_use]
    pub fn ledger_credit(self, score: u8, points: i64) -> i64 {
        match self {
            Self::HitCounter => i64::from(score),
            Self::RunningScore { .. } => points.max(0),
        }
    }
}

/// `round(100 * hits / total)` clamped to `0..=100`; zero when `total` is zero.
///
/// Halves round up.
#[must_use]
pub fn percentage(hits: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let hits = u64::from(hits.min(total));
    let total = u64::from(total);
    let rounded = (200 * hits + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 0), 0);
    }

    #[test]
    fn percentage_matches_formula_for_all_small_totals() {
        for total in 1..=20_u32 {
            for hits in 0..=total {
                let expected = (100.0 * f64::from(hits) / f64::from(total)).round();
                assert_eq!(f64::from(percentage(hits, total)), expected);
            }
        }
    }

    #[test]
    fn running_score_is_floored_at_zero() {
        let policy = ScoringPolicy::ARCADE;
        let mut points = 0;
        points = policy.apply(points, false);
        assert_eq!(points, 0);
        points = policy.apply(points, true);
        points = policy.apply(points, false);
        assert_eq!(points, 5);
    }

    #[test]
    fn hit_counter_misses_are_free() {
        let policy = ScoringPolicy::HitCounter;
        assert_eq!(policy.delta(false), 0);
        assert_eq!(policy.apply(3, true), 4);
    }

    #[test]
    fn final_score_per_policy() {
        assert_eq!(ScoringPolicy::HitCounter.final_score(4, 5, 4), 80);
        assert_eq!(ScoringPolicy::ARCADE.final_score(30, 0, 300), 100);
        assert_eq!(ScoringPolicy::ARCADE.final_score(3, 0, 25), 25);
    }

    #[test]
    fn ledger_credit_per_policy() {
        assert_eq!(ScoringPolicy::HitCounter.ledger_credit(80, 4), 80);
        assert_eq!(ScoringPolicy::ARCADE.ledger_credit(100, 300), 300);
    }
}
