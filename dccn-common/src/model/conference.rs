//! Conference configuration records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: i64,
    pub full_name: String,
    pub short_name: String,
    pub city: String,
    pub country: String,
    pub start_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub site_url: String,
    pub contact_email: String,
    /// Deadline for submissions
    pub submission_end: Option<DateTime<Utc>>,
    /// End of review
    pub review_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub conference_id: i64,
    pub name: String,
    pub order: i64,
}

/// Manuscript language of a submission type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    En,
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Ru => "RU",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ru => "Russian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EN" => Ok(Language::En),
            "RU" => Ok(Language::Ru),
            other => Err(Error::InvalidInput(format!("unknown language: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionType {
    pub id: i64,
    pub conference_id: i64,
    pub name: String,
    pub description: String,
    pub language: Language,
    /// Number of reviews per submission
    pub num_reviews: i64,
    pub min_num_pages: i64,
    pub max_num_pages: i64,
    pub blind_review: bool,
    pub min_num_words_in_review: i64,
    /// Ids of proceedings types a submission of this type may be accepted to
    pub possible_proceedings: Vec<i64>,
}

impl SubmissionType {
    pub const DEFAULT_MIN_WORDS_IN_REVIEW: i64 = 150;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceedingType {
    pub id: i64,
    pub conference_id: i64,
    pub name: String,
    pub description: String,
    pub final_manuscript_deadline: Option<DateTime<Utc>>,
    pub min_num_pages: i64,
    pub max_num_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceedingVolume {
    pub id: i64,
    pub proc_type_id: i64,
    pub name: String,
    pub description: String,
}

/// Kind of file expected in the camera-ready package of a proceedings type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub id: i64,
    pub proc_type_id: i64,
    pub name: String,
    /// Short code used in download names, e.g. `PDF` or `SRC`
    pub code: String,
    pub description: String,
    pub mandatory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("RU".parse::<Language>().unwrap(), Language::Ru);
        assert!("DE".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Ru).unwrap(), "\"RU\"");
    }
}
