//! Reviewers, review stages and review scoring

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FieldError;
use crate::{Error, Result};

/// Score on the 1..=5 scale (1 - Very Poor ... 5 - Excellent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "1 - Very Poor",
            2 => "2 - Below Average",
            3 => "3 - Average",
            4 => "4 - Good",
            _ => "5 - Excellent",
        }
    }
}

impl TryFrom<i64> for Score {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        if (Score::MIN..=Score::MAX).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(Error::InvalidInput(format!(
                "score must be within {}..={}, got {}",
                Score::MIN,
                Score::MAX,
                value
            )))
        }
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> i64 {
        score.0 as i64
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four scored criteria of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    TechnicalMerit,
    Clarity,
    Originality,
    Relevance,
}

impl ScoreField {
    pub const ALL: [ScoreField; 4] = [
        ScoreField::TechnicalMerit,
        ScoreField::Clarity,
        ScoreField::Originality,
        ScoreField::Relevance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScoreField::TechnicalMerit => "technical_merit",
            ScoreField::Clarity => "clarity",
            ScoreField::Originality => "originality",
            ScoreField::Relevance => "relevance",
        }
    }
}

pub const NUM_SCORES: usize = ScoreField::ALL.len();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: i64,
    pub user_id: i64,
    pub conference_id: i64,
}

/// Review period of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStage {
    pub id: i64,
    pub submission_id: i64,
    pub num_reviews_required: i64,
    /// Locked stages reject review edits (set once a decision is committed)
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub reviewer_id: i64,
    pub stage_id: i64,
    pub technical_merit: Option<Score>,
    pub clarity: Option<Score>,
    pub relevance: Option<Score>,
    pub originality: Option<Score>,
    pub details: String,
    pub submitted: bool,
}

impl Review {
    pub fn score(&self, field: ScoreField) -> Option<Score> {
        match field {
            ScoreField::TechnicalMerit => self.technical_merit,
            ScoreField::Clarity => self.clarity,
            ScoreField::Originality => self.originality,
            ScoreField::Relevance => self.relevance,
        }
    }

    pub fn missing_score_fields(&self) -> Vec<ScoreField> {
        ScoreField::ALL
            .iter()
            .copied()
            .filter(|f| self.score(*f).is_none())
            .collect()
    }

    pub fn num_scores_missing(&self) -> usize {
        self.missing_score_fields().len()
    }

    pub fn all_scores_filled(&self) -> bool {
        self.num_scores_missing() == 0
    }

    /// Mean of the four scores, or 0 while any score is missing
    pub fn average_score(&self) -> f64 {
        if !self.all_scores_filled() {
            return 0.0;
        }
        let total: f64 = ScoreField::ALL
            .iter()
            .filter_map(|f| self.score(*f))
            .map(|s| s.value() as f64)
            .sum();
        total / NUM_SCORES as f64
    }

    pub fn check_details(&self, min_words: i64) -> bool {
        check_review_details(&self.details, min_words)
    }

    /// Reviewer-facing progress warnings
    pub fn warnings(&self, min_words: i64) -> Vec<String> {
        let num_missing = self.num_scores_missing();
        let mut warnings = Vec::new();
        if num_missing == NUM_SCORES && self.details.is_empty() {
            warnings.push("Please, start the review".to_string());
            return warnings;
        }
        let filled_details = self.check_details(min_words);
        let filled_scores = num_missing == 0;
        if !filled_scores {
            warnings.push(format!("{} of {} scores not filled", num_missing, NUM_SCORES));
        }
        if !filled_details {
            warnings.push("Review details are incomplete".to_string());
        }
        if filled_scores && filled_details && !self.submitted {
            warnings.push("Review is not submitted yet".to_string());
        }
        warnings
    }

    pub fn apply(&mut self, update: &ReviewUpdate) {
        self.technical_merit = update.technical_merit;
        self.clarity = update.clarity;
        self.relevance = update.relevance;
        self.originality = update.originality;
        self.details = update.details.clone();
        self.submitted = update.submitted;
    }
}

/// Word count check against the submission type's minimum
pub fn check_review_details(details: &str, min_words: i64) -> bool {
    details.split_whitespace().count() as i64 >= min_words
}

/// Reviewer edit of a review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default)]
    pub technical_merit: Option<Score>,
    #[serde(default)]
    pub clarity: Option<Score>,
    #[serde(default)]
    pub relevance: Option<Score>,
    #[serde(default)]
    pub originality: Option<Score>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub submitted: bool,
}

impl ReviewUpdate {
    /// A submitted review needs every score and enough words in the details.
    /// Drafts are always accepted.
    pub fn validate(&self, min_words: i64) -> Result<()> {
        if !self.submitted {
            return Ok(());
        }
        let mut errors = Vec::new();
        let scores = [
            (ScoreField::TechnicalMerit, self.technical_merit),
            (ScoreField::Clarity, self.clarity),
            (ScoreField::Originality, self.originality),
            (ScoreField::Relevance, self.relevance),
        ];
        for (field, score) in scores {
            if score.is_none() {
                errors.push(FieldError::new(field.name(), "Must select a score"));
            }
        }
        if !check_review_details(&self.details, min_words) {
            errors.push(FieldError::new(
                "details",
                format!("Review details must have at least {} words", min_words),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}
