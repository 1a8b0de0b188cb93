//! Outcome counts and the derived mutation score.

use std::ops::{Add, AddAssign};

use serde::Serialize;

use super::outcome::OutcomeKind;

/// Per-bucket outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Score {
    /// Killed count.
    pub killed: u32,
    /// Survived count.
    pub survived: u32,
    /// No-coverage count.
    pub no_coverage: u32,
    /// Timed-out count.
    pub timed_out: u32,
    /// Run-error count.
    pub run_error: u32,
}

impl Score {
    /// Score with a single unit in `kind`'s bucket.
    pub fn of(kind: OutcomeKind) -> Self {
        let mut score = Self::default();
        score.account_for(kind);
        score
    }

    /// Count one more unit in `kind`'s bucket.
    pub fn account_for(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Killed => self.killed += 1,
            OutcomeKind::Survived => self.survived += 1,
            OutcomeKind::NoCoverage => self.no_coverage += 1,
            OutcomeKind::TimedOut => self.timed_out += 1,
            OutcomeKind::RunError => self.run_error += 1,
        }
    }

    /// Count in `kind`'s bucket.
    pub fn count(&self, kind: OutcomeKind) -> u32 {
        match kind {
            OutcomeKind::Killed => self.killed,
            OutcomeKind::Survived => self.survived,
            OutcomeKind::NoCoverage => self.no_coverage,
            OutcomeKind::TimedOut => self.timed_out,
            OutcomeKind::RunError => self.run_error,
        }
    }

    /// Sum of all buckets.
    pub fn total(&self) -> u32 {
        self.killed + self.survived + self.no_coverage + self.timed_out + self.run_error
    }

    /// `100 * killed / total`, or 0 when nothing was counted.
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.killed) * 100.0 / f64::from(total)
        }
    }

    /// Element-wise sum.
    pub fn merge(&mut self, other: &Score) {
        self.killed += other.killed;
        self.survived += other.survived;
        self.no_coverage += other.no_coverage;
        self.timed_out += other.timed_out;
        self.run_error += other.run_error;
    }

    /// Plain-text explanation of how the percentage is derived.
    pub fn describe(&self) -> String {
        format!(
            "score {:.2} = {} killed over {} total ({} killed + {} survived + {} no coverage + {} timed out + {} run errors)",
            self.percentage(),
            self.killed,
            self.total(),
            self.killed,
            self.survived,
            self.no_coverage,
            self.timed_out,
            self.run_error
        )
    }
}

impl Add for Score {
    type Output = Score;

    fn add(mut self, rhs: Score) -> Score {
        self.merge(&rhs);
        self
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        self.merge(&rhs);
    }
}

impl std::iter::Sum for Score {
    fn sum<I: Iterator<Item = Score>>(iter: I) -> Self {
        iter.fold(Score::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_score_is_zero_percent() {
        let score = Score::default();
        assert_eq!(score.total(), 0);
        assert_eq!(score.percentage(), 0.0);
    }

    #[test]
    fn percentage_counts_every_bucket_in_total() {
        let mut score = Score::default();
        for kind in OutcomeKind::ALL {
            score.account_for(kind);
        }
        score.account_for(OutcomeKind::Killed);
        assert_eq!(score.total(), 6);
        assert!((score.percentage() - 200.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn merge_is_element_wise() {
        let a = Score::of(OutcomeKind::Killed) + Score::of(OutcomeKind::Survived);
        let b = Score::of(OutcomeKind::Survived) + Score::of(OutcomeKind::RunError);
        let sum: Score = [a, b].into_iter().sum();
        assert_eq!(sum.killed, 1);
        assert_eq!(sum.survived, 2);
        assert_eq!(sum.run_error, 1);
        assert_eq!(sum.count(OutcomeKind::NoCoverage), 0);
    }

    #[test]
    fn describe_mentions_ratio_parts() {
        let score = Score::of(OutcomeKind::Killed) + Score::of(OutcomeKind::TimedOut);
        let text = score.describe();
        assert!(text.starts_with("score 50.00"));
        assert!(text.contains("1 killed over 2 total"));
        assert!(text.contains("1 timed out"));
    }
}
