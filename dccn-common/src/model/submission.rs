//! Submissions, authorship and the submission status lifecycle

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FieldError;
use crate::{Error, Result};

pub const TITLE_MAX_LENGTH: usize = 250;
pub const ABSTRACT_MAX_LENGTH: usize = 2500;

/// Submission lifecycle status
///
/// ```text
/// SUBMIT ⇄ REVIEW ⇄ ACCEPT / REJECT      (decisions move freely among these three)
///                   ACCEPT ⇄ PRINT → PUBLISH
/// ```
///
/// Serialized and stored as the short codes (`SUBMIT`, `REVIEW`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "SUBMIT")]
    Submitted,
    #[serde(rename = "REVIEW")]
    UnderReview,
    #[serde(rename = "ACCEPT")]
    Accepted,
    #[serde(rename = "REJECT")]
    Rejected,
    #[serde(rename = "PRINT")]
    InPrint,
    #[serde(rename = "PUBLISH")]
    Published,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        SubmissionStatus::Submitted,
        SubmissionStatus::UnderReview,
        SubmissionStatus::Accepted,
        SubmissionStatus::Rejected,
        SubmissionStatus::InPrint,
        SubmissionStatus::Published,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "SUBMIT",
            SubmissionStatus::UnderReview => "REVIEW",
            SubmissionStatus::Accepted => "ACCEPT",
            SubmissionStatus::Rejected => "REJECT",
            SubmissionStatus::InPrint => "PRINT",
            SubmissionStatus::Published => "PUBLISH",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::UnderReview => "Review",
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::Rejected => "Rejected",
            SubmissionStatus::InPrint => "In-print",
            SubmissionStatus::Published => "Published",
        }
    }

    /// Statuses a review decision may put a submission into
    pub fn is_decision_status(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::UnderReview | SubmissionStatus::Accepted | SubmissionStatus::Rejected
        )
    }

    /// Statuses in which camera-ready packages are processed
    pub fn is_camera_ready_status(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Accepted | SubmissionStatus::InPrint | SubmissionStatus::Published
        )
    }

    /// Whether the status is past the point where decisions apply
    pub fn is_in_production(&self) -> bool {
        matches!(self, SubmissionStatus::InPrint | SubmissionStatus::Published)
    }

    pub fn can_transition_to(&self, to: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        match (*self, to) {
            (Submitted, UnderReview) | (UnderReview, Submitted) => true,
            (from, to) if from.is_decision_status() && to.is_decision_status() => true,
            (Accepted, InPrint) | (InPrint, Accepted) | (InPrint, Published) => true,
            _ => false,
        }
    }

    /// Validated transition; returns the target status on success
    pub fn transition(&self, to: SubmissionStatus) -> Result<SubmissionStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(Error::InvalidTransition { from: *self, to })
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SubmissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SubmissionStatus::ALL
            .iter()
            .copied()
            .find(|st| st.code() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown submission status: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub conference_id: i64,
    pub title: String,
    pub r#abstract: String,
    pub stype_id: Option<i64>,
    pub status: SubmissionStatus,
    /// Stored file name of the review manuscript, if uploaded
    pub review_manuscript: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: NaiveDate,
}

impl Submission {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_review_manuscript(&self) -> bool {
        self.review_manuscript
            .as_deref()
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }

    /// Completeness warnings of the record itself
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.has_review_manuscript() {
            warnings.push("Review manuscript missing".to_string());
        }
        if !self.has_title() {
            warnings.push("Missing submission title".to_string());
        }
        warnings
    }

    pub fn can_edit_review_manuscript(&self) -> bool {
        self.status == SubmissionStatus::Submitted
    }

    pub fn can_edit_details(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitted | SubmissionStatus::Accepted)
    }

    /// Anything short of a published paper can be removed
    pub fn is_deletable(&self) -> bool {
        self.status != SubmissionStatus::Published
    }

    /// "12: "First twenty chars"" or "12: (no title)"
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            format!("{}: (no title)", self.id)
        } else {
            let prefix: String = self.title.chars().take(20).collect();
            format!("{}: \"{}\"", self.id, prefix)
        }
    }
}

/// Editable metadata of a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub r#abstract: String,
    #[serde(default)]
    pub stype_id: Option<i64>,
    #[serde(default)]
    pub topic_ids: Vec<i64>,
}

impl SubmissionDetails {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.title.chars().count() > TITLE_MAX_LENGTH {
            errors.push(FieldError::new(
                "title",
                format!("Title is longer than {} characters", TITLE_MAX_LENGTH),
            ));
        }
        if self.r#abstract.chars().count() > ABSTRACT_MAX_LENGTH {
            errors.push(FieldError::new(
                "abstract",
                format!("Abstract is longer than {} characters", ABSTRACT_MAX_LENGTH),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub submission_id: i64,
    pub user_id: i64,
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubmissionStatus::*;

    #[test]
    fn test_status_codes_roundtrip() {
        for status in SubmissionStatus::ALL {
            assert_eq!(status.code().parse::<SubmissionStatus>().unwrap(), status);
        }
        assert!("DRAFT".parse::<SubmissionStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&InPrint).unwrap(), "\"PRINT\"");
        let s: SubmissionStatus = serde_json::from_str("\"REVIEW\"").unwrap();
        assert_eq!(s, UnderReview);
    }

    #[test]
    fn test_review_round_trip_transitions() {
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Submitted));
    }

    #[test]
    fn test_decision_transitions() {
        assert!(UnderReview.can_transition_to(Accepted));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Accepted.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(UnderReview));
        assert!(Accepted.can_transition_to(Accepted));
    }

    #[test]
    fn test_production_transitions() {
        assert!(Accepted.can_transition_to(InPrint));
        assert!(InPrint.can_transition_to(Published));
        assert!(InPrint.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(InPrint));
        assert!(!Published.can_transition_to(InPrint));
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!Submitted.can_transition_to(Accepted));
        assert!(!Submitted.can_transition_to(Published));
        assert!(!Published.can_transition_to(Submitted));
        assert!(!InPrint.can_transition_to(Rejected));

        let err = Submitted.transition(Published).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition { from: Submitted, to: Published }
        ));
    }

    #[test]
    fn test_label() {
        let mut sub = Submission {
            id: 7,
            conference_id: 1,
            title: String::new(),
            r#abstract: String::new(),
            stype_id: None,
            status: Submitted,
            review_manuscript: None,
            created_by: None,
            created_at: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
        };
        assert_eq!(sub.label(), "7: (no title)");
        sub.title = "Queueing networks with retrials".into();
        assert_eq!(sub.label(), "7: \"Queueing networks wi\"");
    }

    #[test]
    fn test_edit_permissions_follow_status() {
        let mut sub = Submission {
            id: 1,
            conference_id: 1,
            title: "Queues".into(),
            r#abstract: String::new(),
            stype_id: None,
            status: Submitted,
            review_manuscript: Some("paper.pdf".into()),
            created_by: None,
            created_at: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
        };
        assert!(sub.can_edit_review_manuscript());
        assert!(sub.can_edit_details());
        assert!(sub.warnings().is_empty());

        sub.status = Accepted;
        assert!(!sub.can_edit_review_manuscript());
        assert!(sub.can_edit_details());

        for status in [UnderReview, Rejected, InPrint, Published] {
            sub.status = status;
            assert!(!sub.can_edit_review_manuscript());
            assert!(!sub.can_edit_details());
        }
        assert!(!sub.is_deletable());
        sub.status = InPrint;
        assert!(sub.is_deletable());
    }

    #[test]
    fn test_details_length_limits() {
        let details = SubmissionDetails {
            title: "й".repeat(TITLE_MAX_LENGTH),
            r#abstract: "x".repeat(ABSTRACT_MAX_LENGTH),
            ..Default::default()
        };
        assert!(details.validate().is_ok());

        let too_long = SubmissionDetails {
            title: "x".repeat(TITLE_MAX_LENGTH + 1),
            r#abstract: "x".repeat(ABSTRACT_MAX_LENGTH + 1),
            ..Default::default()
        };
        match too_long.validate() {
            Err(Error::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "abstract"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
