//! In-memory view of one conference
//!
//! Statistics, filters, mailing lists and exports all work over a
//! [`ConferenceSnapshot`]: the conference with its submissions and their
//! authors, reviews, decisions and camera-ready packages, joined once by
//! [`crate::db::snapshot::load_snapshot`]. Per-conference data sets are small,
//! so everything downstream is plain iteration over these vectors.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{
    Artifact, ArtifactAccess, ArtifactDescriptor, Author, CameraReady, Conference, DecisionKind,
    ProceedingType, ProceedingVolume, Review, ReviewDecision, ReviewDecisionType, ReviewStage,
    Reviewer, Submission, SubmissionStatus, SubmissionType, Topic, UserView,
};
use crate::stats::mean_of_positive;

#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub author: Author,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub review: Review,
    pub reviewer: Reviewer,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    pub decision: ReviewDecision,
    pub decision_type: Option<ReviewDecisionType>,
}

impl DecisionView {
    pub fn kind(&self) -> Option<DecisionKind> {
        self.decision_type.as_ref().map(|dt| dt.decision)
    }

    pub fn allowed_proceedings(&self) -> &[i64] {
        self.decision_type
            .as_ref()
            .map(|dt| dt.allowed_proceedings.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageView {
    pub stage: ReviewStage,
    pub reviews: Vec<ReviewView>,
    pub decision: Option<DecisionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactView {
    pub artifact: Artifact,
    pub descriptor: ArtifactDescriptor,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraReadyView {
    pub camera_ready: CameraReady,
    pub artifacts: Vec<ArtifactView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub submission: Submission,
    /// Ordered by `Author::order`
    pub authors: Vec<AuthorView>,
    pub topic_ids: Vec<i64>,
    pub stype: Option<SubmissionType>,
    pub stage: Option<StageView>,
    pub camera_ready: Vec<CameraReadyView>,
}

impl SubmissionView {
    pub fn id(&self) -> i64 {
        self.submission.id
    }

    pub fn status(&self) -> SubmissionStatus {
        self.submission.status
    }

    pub fn reviews(&self) -> &[ReviewView] {
        self.stage
            .as_ref()
            .map(|s| s.reviews.as_slice())
            .unwrap_or(&[])
    }

    pub fn decision(&self) -> Option<&DecisionView> {
        self.stage.as_ref().and_then(|s| s.decision.as_ref())
    }

    /// Completeness warnings shown to authors and chairs
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.submission.warnings();
        if self.status() == SubmissionStatus::Accepted {
            for cr in self.camera_ready.iter().filter(|cr| cr.camera_ready.active) {
                for av in &cr.artifacts {
                    if av.descriptor.mandatory && !av.artifact.has_file() {
                        warnings.push(format!("{} missing", av.descriptor.name));
                    }
                }
            }
        }
        warnings
    }

    pub fn is_complete(&self) -> bool {
        self.warnings().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.submission.has_title()
    }

    /// Mean of review scores of completely scored reviews; 0 if none
    pub fn score(&self) -> f64 {
        mean_of_positive(self.reviews().iter().map(|r| r.review.average_score()))
    }

    pub fn min_words_in_review(&self) -> i64 {
        self.stype
            .as_ref()
            .map(|st| st.min_num_words_in_review)
            .unwrap_or(SubmissionType::DEFAULT_MIN_WORDS_IN_REVIEW)
    }

    pub fn count_required_reviews(&self) -> i64 {
        self.stype.as_ref().map(|st| st.num_reviews).unwrap_or(0)
    }

    pub fn count_missing_reviews(&self) -> i64 {
        (self.count_required_reviews() - self.reviews().len() as i64).max(0)
    }

    pub fn num_submitted_reviews(&self) -> i64 {
        self.reviews().iter().filter(|r| r.review.submitted).count() as i64
    }

    pub fn review_finished(&self) -> bool {
        self.num_submitted_reviews() == self.count_required_reviews()
    }

    pub fn has_incomplete_reviews(&self) -> bool {
        self.reviews().iter().any(|r| !r.review.submitted)
    }

    /// Feed warnings: unfinished and unassigned reviews
    pub fn review_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let num_incomplete = self
            .reviews()
            .iter()
            .filter(|r| r.review.average_score() == 0.0)
            .count();
        if num_incomplete > 0 {
            warnings.push(format!("{} reviews are not finished", num_incomplete));
        }
        let num_missing = self.count_missing_reviews();
        if num_missing > 0 {
            warnings.push(format!("{} reviews are not assigned", num_missing));
        }
        warnings
    }

    pub fn authors_display(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.user.full_name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_author(&self, user_id: i64) -> bool {
        self.authors.iter().any(|a| a.author.user_id == user_id)
    }

    pub fn is_reviewer(&self, user_id: i64) -> bool {
        self.reviews().iter().any(|r| r.reviewer.user_id == user_id)
    }

    pub fn is_deletable_by(&self, user_id: i64, is_chair: bool) -> bool {
        (is_chair || self.is_author(user_id)) && self.submission.is_deletable()
    }

    pub fn is_manuscript_viewable_by(&self, user_id: i64, is_chair: bool) -> bool {
        is_chair || self.is_author(user_id) || self.is_reviewer(user_id)
    }

    pub fn artifact_access(&self, camera_ready: &CameraReady) -> ArtifactAccess {
        ArtifactAccess::for_status(camera_ready.active, self.status())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceSnapshot {
    pub conference: Conference,
    pub chairs: Vec<i64>,
    pub topics: Vec<Topic>,
    pub stypes: Vec<SubmissionType>,
    pub proc_types: Vec<ProceedingType>,
    pub volumes: Vec<ProceedingVolume>,
    pub decision_types: Vec<ReviewDecisionType>,
    pub reviewers: Vec<Reviewer>,
    /// Ordered by id
    pub submissions: Vec<SubmissionView>,
    /// Every active user of the site
    pub users: Vec<UserView>,
}

impl ConferenceSnapshot {
    pub fn is_chair(&self, user_id: i64) -> bool {
        self.chairs.contains(&user_id)
    }

    pub fn submission(&self, id: i64) -> Option<&SubmissionView> {
        self.submissions.iter().find(|s| s.id() == id)
    }

    pub fn user(&self, id: i64) -> Option<&UserView> {
        self.users.iter().find(|u| u.id() == id)
    }

    pub fn stype(&self, id: i64) -> Option<&SubmissionType> {
        self.stypes.iter().find(|st| st.id == id)
    }

    /// Ids of users authoring at least one submission of the conference
    pub fn author_ids(&self) -> BTreeSet<i64> {
        self.submissions
            .iter()
            .flat_map(|s| s.authors.iter().map(|a| a.author.user_id))
            .collect()
    }

    pub fn submissions_of(&self, user_id: i64) -> Vec<&SubmissionView> {
        self.submissions
            .iter()
            .filter(|s| s.is_author(user_id))
            .collect()
    }

    /// Reviews assigned to the user within this conference
    pub fn reviews_of(&self, user_id: i64) -> Vec<(&SubmissionView, &ReviewView)> {
        self.submissions
            .iter()
            .flat_map(|s| {
                s.reviews()
                    .iter()
                    .filter(move |r| r.reviewer.user_id == user_id)
                    .map(move |r| (s, r))
            })
            .collect()
    }

    /// Decision types allowed for the submission
    pub fn decision_types_for(&self, sub: &SubmissionView) -> Vec<&ReviewDecisionType> {
        self.decision_types
            .iter()
            .filter(|dt| dt.is_allowed_for(self.conference.id, sub.stype.as_ref()))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders shared by unit tests of the modules working over snapshots

    use super::*;
    use crate::model::{Language, Profile, Score, User};
    use chrono::{NaiveDate, TimeZone, Utc};

    pub fn user(id: i64, first: &str, last: &str, country: &str, affiliation: &str) -> UserView {
        UserView {
            user: User {
                id,
                email: format!("user{}@example.org", id),
                is_active: true,
                date_joined: Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap(),
            },
            profile: Profile {
                first_name: first.to_string(),
                last_name: last.to_string(),
                first_name_rus: String::new(),
                middle_name_rus: String::new(),
                last_name_rus: String::new(),
                affiliation: affiliation.to_string(),
                degree: String::new(),
                country: country.to_string(),
            },
        }
    }

    pub fn stype(id: i64, num_reviews: i64) -> SubmissionType {
        SubmissionType {
            id,
            conference_id: 1,
            name: format!("Type {}", id),
            description: String::new(),
            language: Language::En,
            num_reviews,
            min_num_pages: 4,
            max_num_pages: 8,
            blind_review: false,
            min_num_words_in_review: 3,
            possible_proceedings: vec![1],
        }
    }

    pub fn submission(id: i64, title: &str, status: SubmissionStatus) -> SubmissionView {
        SubmissionView {
            submission: Submission {
                id,
                conference_id: 1,
                title: title.to_string(),
                r#abstract: String::new(),
                stype_id: Some(1),
                status,
                review_manuscript: Some(format!("manuscript-{}.pdf", id)),
                created_by: None,
                created_at: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
            },
            authors: Vec::new(),
            topic_ids: Vec::new(),
            stype: Some(stype(1, 2)),
            stage: None,
            camera_ready: Vec::new(),
        }
    }

    pub fn with_author(mut sub: SubmissionView, user: UserView) -> SubmissionView {
        let order = sub.authors.len() as i64;
        sub.authors.push(AuthorView {
            author: Author {
                id: sub.id() * 100 + order,
                submission_id: sub.id(),
                user_id: user.id(),
                order,
            },
            user,
        });
        sub
    }

    /// Adds a review whose four scores all equal `score` (0 leaves them empty)
    pub fn with_review(mut sub: SubmissionView, reviewer_user: i64, score: i64, submitted: bool) -> SubmissionView {
        let sub_id = sub.id();
        let stage = sub.stage.get_or_insert_with(|| StageView {
            stage: ReviewStage {
                id: sub_id,
                submission_id: sub_id,
                num_reviews_required: 2,
                locked: false,
            },
            reviews: Vec::new(),
            decision: None,
        });
        let s = if score > 0 { Score::try_from(score).ok() } else { None };
        let id = sub_id * 10 + stage.reviews.len() as i64;
        stage.reviews.push(ReviewView {
            review: Review {
                id,
                reviewer_id: reviewer_user,
                stage_id: sub_id,
                technical_merit: s,
                clarity: s,
                relevance: s,
                originality: s,
                details: "one two three".to_string(),
                submitted,
            },
            reviewer: Reviewer {
                id: reviewer_user,
                user_id: reviewer_user,
                conference_id: 1,
            },
        });
        sub
    }

    pub fn conference() -> Conference {
        Conference {
            id: 1,
            full_name: "Distributed Computer and Communication Networks".into(),
            short_name: "DCCN 2019".into(),
            city: "Moscow".into(),
            country: "RU".into(),
            start_date: NaiveDate::from_ymd_opt(2019, 9, 23),
            close_date: NaiveDate::from_ymd_opt(2019, 9, 27),
            site_url: "https://dccn.ru".into(),
            contact_email: "dccn@example.org".into(),
            submission_end: Utc.with_ymd_and_hms(2019, 5, 1, 23, 59, 0).single(),
            review_end: Utc.with_ymd_and_hms(2019, 6, 1, 23, 59, 0).single(),
        }
    }

    pub fn snapshot(submissions: Vec<SubmissionView>, users: Vec<UserView>) -> ConferenceSnapshot {
        ConferenceSnapshot {
            conference: conference(),
            chairs: vec![1],
            topics: Vec::new(),
            stypes: vec![stype(1, 2)],
            proc_types: Vec::new(),
            volumes: Vec::new(),
            decision_types: Vec::new(),
            reviewers: Vec::new(),
            submissions,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_warnings_for_empty_submission() {
        let mut sub = submission(1, "", SubmissionStatus::Submitted);
        sub.submission.review_manuscript = None;
        assert_eq!(
            sub.warnings(),
            vec!["Review manuscript missing", "Missing submission title"]
        );
        assert!(sub.is_empty());
        assert!(!sub.is_complete());
    }

    #[test]
    fn test_warnings_include_missing_mandatory_artifacts_when_accepted() {
        let mut sub = submission(1, "Paper", SubmissionStatus::Accepted);
        let descriptor = |id, name: &str, mandatory| ArtifactDescriptor {
            id,
            proc_type_id: 1,
            name: name.to_string(),
            code: "PDF".to_string(),
            description: String::new(),
            mandatory,
        };
        sub.camera_ready.push(CameraReadyView {
            camera_ready: CameraReady {
                id: 1,
                submission_id: 1,
                proc_type_id: 1,
                volume_id: None,
                active: true,
            },
            artifacts: vec![
                ArtifactView {
                    artifact: Artifact { id: 1, camera_ready_id: 1, descriptor_id: 1, file_name: None },
                    descriptor: descriptor(1, "Camera-ready PDF", true),
                },
                ArtifactView {
                    artifact: Artifact { id: 2, camera_ready_id: 1, descriptor_id: 2, file_name: None },
                    descriptor: descriptor(2, "Sources", false),
                },
            ],
        });
        assert_eq!(sub.warnings(), vec!["Camera-ready PDF missing"]);
        sub.submission.status = SubmissionStatus::InPrint;
        assert!(sub.warnings().is_empty());
    }

    #[test]
    fn test_review_counters() {
        let sub = submission(1, "Paper", SubmissionStatus::UnderReview);
        assert_eq!(sub.count_required_reviews(), 2);
        assert_eq!(sub.count_missing_reviews(), 2);
        assert!(!sub.review_finished());

        let sub = with_review(sub, 5, 4, true);
        let sub = with_review(sub, 6, 0, false);
        assert_eq!(sub.count_missing_reviews(), 0);
        assert_eq!(sub.num_submitted_reviews(), 1);
        assert!(sub.has_incomplete_reviews());
        assert!(!sub.review_finished());
        assert_eq!(sub.score(), 4.0);
        assert_eq!(sub.review_warnings(), vec!["1 reviews are not finished"]);
    }

    #[test]
    fn test_missing_stype_requires_no_reviews() {
        let mut sub = submission(1, "Paper", SubmissionStatus::UnderReview);
        sub.stype = None;
        assert_eq!(sub.count_required_reviews(), 0);
        assert_eq!(sub.count_missing_reviews(), 0);
        assert!(sub.review_finished());
    }

    #[test]
    fn test_permissions() {
        let sub = with_author(
            submission(1, "Paper", SubmissionStatus::UnderReview),
            user(10, "Anna", "Ivanova", "RU", "RUDN"),
        );
        let sub = with_review(sub, 20, 0, false);
        assert!(sub.is_deletable_by(10, false));
        assert!(!sub.is_deletable_by(20, false));
        assert!(sub.is_manuscript_viewable_by(20, false));
        assert!(!sub.is_manuscript_viewable_by(30, false));
        assert!(sub.is_manuscript_viewable_by(30, true));

        let mut published = sub.clone();
        published.submission.status = SubmissionStatus::Published;
        assert!(!published.is_deletable_by(10, true));
    }

    #[test]
    fn test_snapshot_lookups() {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let sub = with_author(submission(1, "Paper", SubmissionStatus::UnderReview), anna.clone());
        let sub = with_review(sub, 20, 3, true);
        let snap = snapshot(vec![sub], vec![anna]);
        assert!(snap.is_chair(1));
        assert_eq!(snap.author_ids().into_iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(snap.submissions_of(10).len(), 1);
        assert_eq!(snap.reviews_of(20).len(), 1);
        assert!(snap.reviews_of(10).is_empty());
        assert_eq!(snap.submission(1).map(|s| s.authors_display()), Some("Anna Ivanova".to_string()));
    }
}
