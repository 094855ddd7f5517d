//! Domain records
//!
//! Plain data types mirroring the database tables plus the small amount of
//! behavior that belongs to a single record (score averaging, status
//! transitions, name formatting). Cross-record logic lives in
//! [`crate::snapshot`], [`crate::stats`] and [`crate::filters`].

pub mod conference;
pub mod decision;
pub mod proceedings;
pub mod review;
pub mod submission;
pub mod user;

pub use conference::{
    ArtifactDescriptor, Conference, Language, ProceedingType, ProceedingVolume, SubmissionType,
    Topic,
};
pub use decision::{DecisionKind, ReviewDecision, ReviewDecisionType};
pub use proceedings::{Artifact, ArtifactAccess, CameraReady};
pub use review::{check_review_details, Review, ReviewStage, ReviewUpdate, Reviewer, Score, ScoreField};
pub use submission::{Author, Submission, SubmissionDetails, SubmissionStatus};
pub use user::{Profile, User, UserView};
