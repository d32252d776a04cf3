use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("cannot summarize a quiz with no questions")]
    EmptyTotal,

    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Qualitative band for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl Tier {
    /// Highest tier whose threshold `percentage` reaches.
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Tier::Excellent,
            80..=89 => Tier::VeryGood,
            70..=79 => Tier::Good,
            50..=69 => Tier::Fair,
            _ => Tier::NeedsImprovement,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::VeryGood => "Very good",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::NeedsImprovement => "Needs improvement",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Tier::Excellent => "Outstanding work, you know these words well.",
            Tier::VeryGood => "Great job, only a few slips.",
            Tier::Good => "Solid result, keep practicing the misses.",
            Tier::Fair => "You're getting there, review the list and try again.",
            Tier::NeedsImprovement => "Keep going, another round will help.",
        }
    }
}

/// Final score of a quiz, with its rounded percentage and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    score: u32,
    total: u32,
    percentage: u32,
    tier: Tier,
}

impl ScoreSummary {
    /// Summarize `score` correct answers out of `total` questions.
    ///
    /// The percentage is rounded half-up.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::EmptyTotal` when `total` is zero and
    /// `SummaryError::ScoreExceedsTotal` when `score > total`.
    pub fn new(score: u32, total: u32) -> Result<Self, SummaryError> {
        if total == 0 {
            return Err(SummaryError::EmptyTotal);
        }
        if score > total {
            return Err(SummaryError::ScoreExceedsTotal { score, total });
        }
        let (score_wide, total_wide) = (u64::from(score), u64::from(total));
        let rounded = (200 * score_wide + total_wide) / (2 * total_wide);
        // score <= total keeps this within 0..=100
        let percentage = u32::try_from(rounded).unwrap_or(100);

        Ok(Self {
            score,
            total,
            percentage,
            tier: Tier::from_percentage(percentage),
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}%) - {}",
            self.score,
            self.total,
            self.percentage,
            self.tier.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_scores_map_to_tiers() {
        let s = ScoreSummary::new(8, 10).unwrap();
        assert_eq!((s.percentage(), s.tier()), (80, Tier::VeryGood));

        let s = ScoreSummary::new(5, 10).unwrap();
        assert_eq!((s.percentage(), s.tier()), (50, Tier::Fair));

        let s = ScoreSummary::new(4, 10).unwrap();
        assert_eq!((s.percentage(), s.tier()), (40, Tier::NeedsImprovement));

        let s = ScoreSummary::new(9, 10).unwrap();
        assert_eq!(s.tier(), Tier::Excellent);

        let s = ScoreSummary::new(7, 10).unwrap();
        assert_eq!(s.tier(), Tier::Good);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(ScoreSummary::new(1, 3).unwrap().percentage(), 33);
        assert_eq!(ScoreSummary::new(2, 3).unwrap().percentage(), 67);
        assert_eq!(ScoreSummary::new(1, 8).unwrap().percentage(), 13);
        assert_eq!(ScoreSummary::new(0, 4).unwrap().percentage(), 0);
        assert_eq!(ScoreSummary::new(4, 4).unwrap().percentage(), 100);
    }

    #[test]
    fn rounding_can_lift_into_next_tier() {
        // 89.5% rounds to 90
        let s = ScoreSummary::new(179, 200).unwrap();
        assert_eq!(s.percentage(), 90);
        assert_eq!(s.tier(), Tier::Excellent);
    }

    #[test]
    fn rejects_empty_or_inconsistent_totals() {
        assert_eq!(ScoreSummary::new(0, 0).unwrap_err(), SummaryError::EmptyTotal);
        assert!(matches!(
            ScoreSummary::new(3, 2),
            Err(SummaryError::ScoreExceedsTotal { score: 3, total: 2 })
        ));
    }

    #[test]
    fn display_includes_label() {
        let s = ScoreSummary::new(1, 2).unwrap();
        assert_eq!(s.to_string(), "1/2 (50%) - Fair");
    }
}
