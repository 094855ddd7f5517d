//! Review decisions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{SubmissionStatus, SubmissionType};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionKind {
    Accept,
    Reject,
}

impl DecisionKind {
    pub fn code(&self) -> &'static str {
        match self {
            DecisionKind::Accept => "ACCEPT",
            DecisionKind::Reject => "REJECT",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DecisionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACCEPT" => Ok(DecisionKind::Accept),
            "REJECT" => Ok(DecisionKind::Reject),
            other => Err(Error::InvalidInput(format!("unknown decision: {}", other))),
        }
    }
}

/// Status a committed decision puts the submission into; no decision means
/// the submission goes back to review
pub fn decision_status(kind: Option<DecisionKind>) -> SubmissionStatus {
    match kind {
        None => SubmissionStatus::UnderReview,
        Some(DecisionKind::Accept) => SubmissionStatus::Accepted,
        Some(DecisionKind::Reject) => SubmissionStatus::Rejected,
    }
}

/// A named outcome chairs can choose, e.g. "Accept to Springer volume"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecisionType {
    pub id: i64,
    pub conference_id: i64,
    pub decision: DecisionKind,
    pub description: String,
    /// Proceedings types an accepted paper is published in
    pub allowed_proceedings: Vec<i64>,
}

impl ReviewDecisionType {
    /// Reject types are always allowed; accept types only when they share a
    /// proceedings type with what the submission type permits
    pub fn is_allowed_for(&self, conference_id: i64, stype: Option<&SubmissionType>) -> bool {
        if self.conference_id != conference_id {
            return false;
        }
        match self.decision {
            DecisionKind::Reject => true,
            DecisionKind::Accept => match stype {
                Some(st) => self
                    .allowed_proceedings
                    .iter()
                    .any(|pt| st.possible_proceedings.contains(pt)),
                None => false,
            },
        }
    }
}

/// Decision recorded for one review stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub id: i64,
    pub stage_id: i64,
    pub decision_type_id: Option<i64>,
    /// Whether the decision has been applied to the submission status
    pub committed: bool,
}

impl ReviewDecision {
    /// Change the chosen type; any real change requires a new commit
    pub fn set_decision_type(&mut self, decision_type_id: Option<i64>) -> bool {
        if self.decision_type_id == decision_type_id {
            return false;
        }
        self.decision_type_id = decision_type_id;
        self.committed = false;
        true
    }
}
