use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(i64),
}

/// A 0..=100 score as produced by the scoring collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    /// Score given when the scoring collaborator fails or the response has no text.
    pub const FALLBACK: Score = Score(50);

    /// Evaluations at or above this score are passing.
    pub const PASSING: Score = Score(70);

    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` when `value` is above 100.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > 100 {
            return Err(ScoreError::OutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// Rounds and clamps an arbitrary number into range; non-finite input yields 0.
    #[must_use]
    pub fn saturating_from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::MIN;
        }
        let rounded = value.round().clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = rounded as u8;
        Self(v)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_passing(&self) -> bool {
        *self >= Self::PASSING
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ScoreError::OutOfRange(value))
            .and_then(|v| Score::new(v).map_err(|_| ScoreError::OutOfRange(value)))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `round(sum / count)` with half-up rounding, in integer arithmetic.
///
/// Returns 0 for an empty set.
#[must_use]
pub fn rounded_mean(sum: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (2 * sum + count) / (2 * count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_scores_above_one_hundred() {
        assert!(Score::new(101).is_err());
        assert!(Score::try_from(-1).is_err());
        assert_eq!(Score::try_from(100).unwrap(), Score::MAX);
    }

    #[test]
    fn saturating_conversion_rounds_and_clamps() {
        assert_eq!(Score::saturating_from_f64(84.5).value(), 85);
        assert_eq!(Score::saturating_from_f64(140.0).value(), 100);
        assert_eq!(Score::saturating_from_f64(-3.0).value(), 0);
        assert_eq!(Score::saturating_from_f64(f64::NAN).value(), 0);
    }

    #[test]
    fn rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(0, 0), 0);
        assert_eq!(rounded_mean(140, 2), 70);
        assert_eq!(rounded_mean(5, 2), 3);
        assert_eq!(rounded_mean(7, 3), 2);
        assert_eq!(rounded_mean(8, 3), 3);
    }

    #[test]
    fn passing_threshold_is_seventy() {
        assert!(Score::new(70).unwrap().is_passing());
        assert!(!Score::new(69).unwrap().is_passing());
    }
}
