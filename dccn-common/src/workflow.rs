//! Chair and reviewer operations that change submission state
//!
//! Every operation runs in one transaction: the submission is read, the
//! requested change is validated against its current status, rows are
//! written, and the events describing the change are emitted once the
//! transaction has committed. A rejected operation leaves the database
//! untouched.

use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{conferences, decisions, proceedings, reviews, submissions, users};
use crate::error::FieldError;
use crate::events::{DccnEvent, EventBus};
use crate::model::decision::decision_status;
use crate::model::{
    Author, CameraReady, DecisionKind, Review, ReviewDecision, ReviewDecisionType, ReviewUpdate,
    Submission, SubmissionDetails, SubmissionStatus, SubmissionType,
};
use crate::time;
use crate::{Error, Result};

#[derive(Clone)]
pub struct Workflow {
    pool: SqlitePool,
    events: Arc<EventBus>,
}

impl Workflow {
    pub fn new(pool: SqlitePool, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    fn emit_all(&self, events: Vec<DccnEvent>) {
        for event in events {
            debug!(event = event.event_type(), "Emitting event");
            self.events.emit_lossy(event);
        }
    }

    /// SUBMIT -> REVIEW for a complete submission
    ///
    /// Creates the review stage and its empty decision on first entry and
    /// unlocks the stage on re-entry.
    pub async fn start_review(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        check_transition(sub.status, &[SubmissionStatus::Submitted], SubmissionStatus::UnderReview)?;

        let warnings = sub.warnings();
        if !warnings.is_empty() {
            return Err(Error::Validation(
                warnings
                    .into_iter()
                    .map(|w| FieldError::new("submission", w))
                    .collect(),
            ));
        }

        let num_reviews = stype_of(&mut tx, &sub).await?.map(|st| st.num_reviews).unwrap_or(0);
        let stage = reviews::ensure_stage(&mut tx, sub.id, num_reviews).await?;
        reviews::set_stage_locked(&mut tx, stage.id, false).await?;
        decisions::ensure_decision(&mut tx, stage.id).await?;

        let event = change_status(&mut tx, &sub, SubmissionStatus::UnderReview).await?;
        sync_camera_ready(&mut tx, sub.id, SubmissionStatus::UnderReview, None, false).await?;
        tx.commit().await?;

        info!(submission_id, "Submission moved to review");
        self.emit_all(vec![event]);
        Ok(Submission {
            status: SubmissionStatus::UnderReview,
            ..sub
        })
    }

    /// REVIEW -> SUBMIT, handing the paper back to the authors
    pub async fn revoke_review(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        self.simple_transition(
            conference_id,
            submission_id,
            &[SubmissionStatus::UnderReview],
            SubmissionStatus::Submitted,
        )
        .await
    }

    /// ACCEPT -> PRINT
    pub async fn send_to_print(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        self.simple_transition(
            conference_id,
            submission_id,
            &[SubmissionStatus::Accepted],
            SubmissionStatus::InPrint,
        )
        .await
    }

    /// PRINT -> PUBLISH
    pub async fn publish(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        self.simple_transition(
            conference_id,
            submission_id,
            &[SubmissionStatus::InPrint],
            SubmissionStatus::Published,
        )
        .await
    }

    /// PRINT -> ACCEPT
    pub async fn revoke_print(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        self.simple_transition(
            conference_id,
            submission_id,
            &[SubmissionStatus::InPrint],
            SubmissionStatus::Accepted,
        )
        .await
    }

    async fn simple_transition(
        &self,
        conference_id: i64,
        submission_id: i64,
        from: &[SubmissionStatus],
        to: SubmissionStatus,
    ) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        check_transition(sub.status, from, to)?;

        let event = change_status(&mut tx, &sub, to).await?;
        let decision = current_decision(&mut tx, sub.id).await?;
        sync_camera_ready(&mut tx, sub.id, to, decision.as_ref(), false).await?;
        tx.commit().await?;

        info!(submission_id, from = %sub.status, to = %to, "Submission status changed");
        self.emit_all(vec![event]);
        Ok(Submission { status: to, ..sub })
    }

    /// Choose the decision type of a submission under review
    ///
    /// A change of type un-commits the decision; setting the same type again
    /// keeps it as it is.
    pub async fn update_decision(
        &self,
        conference_id: i64,
        submission_id: i64,
        decision_type_id: Option<i64>,
    ) -> Result<ReviewDecision> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        let stage = reviews::find_stage_by_submission(&mut tx, sub.id)
            .await?
            .ok_or_else(|| Error::InvalidInput(format!("submission #{} was never reviewed", sub.id)))?;

        if let Some(dt_id) = decision_type_id {
            let dt = decisions::get_decision_type(&mut tx, dt_id).await?;
            let stype = stype_of(&mut tx, &sub).await?;
            if !dt.is_allowed_for(conference_id, stype.as_ref()) {
                return Err(Error::Validation(vec![FieldError::new(
                    "decision_type_id",
                    format!("Decision type #{} is not allowed for this submission", dt_id),
                )]));
            }
        }

        let mut decision = decisions::ensure_decision(&mut tx, stage.id).await?;
        if decision.set_decision_type(decision_type_id) {
            decisions::save_decision(&mut tx, &decision).await?;
            debug!(submission_id, ?decision_type_id, "Decision changed, awaiting commit");
        }
        tx.commit().await?;
        Ok(decision)
    }

    /// Apply the decision to the submission status
    ///
    /// No-op for an already committed decision. Papers in print or published
    /// keep their status. Otherwise the status follows the decision type
    /// (none: REVIEW, accept: ACCEPT, reject: REJECT), the review stage is
    /// locked for final decisions, and camera-ready packages are synchronized.
    pub async fn commit_decision(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        let stage = reviews::find_stage_by_submission(&mut tx, sub.id)
            .await?
            .ok_or_else(|| Error::InvalidInput(format!("submission #{} was never reviewed", sub.id)))?;
        let mut decision = decisions::ensure_decision(&mut tx, stage.id).await?;

        if decision.committed {
            debug!(submission_id, "Decision already committed");
            return Ok(sub);
        }

        let decision_type = match decision.decision_type_id {
            Some(id) => Some(decisions::get_decision_type(&mut tx, id).await?),
            None => None,
        };
        let kind = decision_type.as_ref().map(|dt| dt.decision);

        let mut events = Vec::new();
        let mut status = sub.status;
        if !sub.status.is_in_production() {
            let new_status = decision_status(kind);
            check_transition(
                sub.status,
                &[
                    SubmissionStatus::UnderReview,
                    SubmissionStatus::Accepted,
                    SubmissionStatus::Rejected,
                ],
                new_status,
            )?;
            if new_status != sub.status {
                events.push(change_status(&mut tx, &sub, new_status).await?);
            }
            let locked = matches!(new_status, SubmissionStatus::Accepted | SubmissionStatus::Rejected);
            reviews::set_stage_locked(&mut tx, stage.id, locked).await?;
            status = new_status;
        }

        decision.committed = true;
        decisions::save_decision(&mut tx, &decision).await?;
        sync_camera_ready(&mut tx, sub.id, status, decision_type.as_ref(), true).await?;
        tx.commit().await?;

        info!(submission_id, decision = ?kind, status = %status, "Decision committed");
        events.push(DccnEvent::DecisionCommitted {
            conference_id,
            submission_id,
            decision: kind,
            timestamp: time::now(),
        });
        self.emit_all(events);
        Ok(Submission { status, ..sub })
    }

    /// Assign a user to review a submission under review
    ///
    /// The user becomes a reviewer of the conference if not yet one. Authors
    /// cannot review their own paper and nobody reviews a paper twice.
    pub async fn assign_reviewer(
        &self,
        conference_id: i64,
        submission_id: i64,
        user_id: i64,
    ) -> Result<Review> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        if sub.status != SubmissionStatus::UnderReview {
            return Err(Error::InvalidInput(format!(
                "reviewers can be assigned only to submissions under review, #{} is {}",
                sub.id, sub.status
            )));
        }

        let authors = submissions::list_authors(&mut tx, sub.id).await?;
        if authors.iter().any(|a| a.user_id == user_id) {
            return Err(Error::InvalidInput(format!(
                "user #{} is an author of submission #{}",
                user_id, sub.id
            )));
        }

        let num_reviews = stype_of(&mut tx, &sub).await?.map(|st| st.num_reviews).unwrap_or(0);
        let stage = reviews::ensure_stage(&mut tx, sub.id, num_reviews).await?;
        if stage.locked {
            return Err(Error::InvalidInput(format!("review of submission #{} is closed", sub.id)));
        }
        let assigned = reviews::list_reviews(&mut tx, stage.id).await?;
        if assigned.iter().any(|(_, rv)| rv.user_id == user_id) {
            return Err(Error::InvalidInput(format!(
                "user #{} already reviews submission #{}",
                user_id, sub.id
            )));
        }

        let reviewer = reviews::ensure_reviewer(&mut tx, conference_id, user_id).await?;
        let review = reviews::create_review(&mut tx, reviewer.id, stage.id).await?;
        tx.commit().await?;

        info!(submission_id, user_id, review_id = review.id, "Reviewer assigned");
        self.emit_all(vec![DccnEvent::ReviewAssigned {
            conference_id,
            submission_id,
            review_id: review.id,
            user_id,
            timestamp: time::now(),
        }]);
        Ok(review)
    }

    /// Cancel a review assignment
    pub async fn delete_review(&self, conference_id: i64, submission_id: i64, review_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        let (review, reviewer) = reviews::get_review(&mut tx, review_id).await?;
        let stage = reviews::get_stage(&mut tx, review.stage_id).await?;
        if stage.submission_id != sub.id {
            return Err(Error::not_found("review", review_id));
        }
        reviews::delete_review(&mut tx, review_id).await?;
        tx.commit().await?;

        info!(submission_id, review_id, "Review cancelled");
        self.emit_all(vec![DccnEvent::ReviewCancelled {
            conference_id,
            submission_id,
            review_id,
            user_id: reviewer.user_id,
            timestamp: time::now(),
        }]);
        Ok(())
    }

    /// Reviewer edit of scores, details and the submitted flag
    pub async fn update_review(
        &self,
        review_id: i64,
        acting_user: i64,
        update: &ReviewUpdate,
    ) -> Result<Review> {
        let mut tx = self.pool.begin().await?;
        let (mut review, reviewer) = reviews::get_review(&mut tx, review_id).await?;
        if reviewer.user_id != acting_user {
            return Err(Error::PermissionDenied(format!(
                "review #{} belongs to another reviewer",
                review_id
            )));
        }

        let stage = reviews::get_stage(&mut tx, review.stage_id).await?;
        if stage.locked {
            return Err(Error::InvalidInput(format!(
                "review #{} is locked after the decision",
                review_id
            )));
        }

        let sub = submissions::get_submission(&mut tx, stage.submission_id).await?;
        let min_words = stype_of(&mut tx, &sub)
            .await?
            .map(|st| st.min_num_words_in_review)
            .unwrap_or(SubmissionType::DEFAULT_MIN_WORDS_IN_REVIEW);
        update.validate(min_words)?;

        let newly_submitted = update.submitted && !review.submitted;
        review.apply(update);
        reviews::save_review(&mut tx, &review).await?;
        tx.commit().await?;

        if newly_submitted {
            info!(review_id, submission_id = sub.id, "Review submitted");
            self.emit_all(vec![DccnEvent::ReviewSubmitted {
                conference_id: sub.conference_id,
                submission_id: sub.id,
                review_id,
                timestamp: time::now(),
            }]);
        }
        Ok(review)
    }

    /// Put a camera-ready package into a volume of its proceedings type
    pub async fn assign_volume(
        &self,
        conference_id: i64,
        camera_ready_id: i64,
        volume_id: Option<i64>,
    ) -> Result<CameraReady> {
        let mut tx = self.pool.begin().await?;
        let mut camera_ready = proceedings::get_camera_ready(&mut tx, camera_ready_id).await?;
        load_submission(&mut tx, conference_id, camera_ready.submission_id).await?;

        if let Some(vid) = volume_id {
            let volume = conferences::get_volume(&mut tx, vid).await?;
            if volume.proc_type_id != camera_ready.proc_type_id {
                return Err(Error::Validation(vec![FieldError::new(
                    "volume_id",
                    format!(
                        "Volume #{} does not belong to proceedings type #{}",
                        vid, camera_ready.proc_type_id
                    ),
                )]));
            }
        }

        proceedings::set_volume(&mut tx, camera_ready.id, volume_id).await?;
        tx.commit().await?;

        camera_ready.volume_id = volume_id;
        Ok(camera_ready)
    }

    /// Chair edit of title, abstract, type and topics
    ///
    /// Allowed while the paper is submitted or accepted. The type and the
    /// topics must belong to the conference.
    pub async fn update_details(
        &self,
        conference_id: i64,
        submission_id: i64,
        details: &SubmissionDetails,
    ) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        ensure_editable(&sub, sub.can_edit_details(), "details")?;
        details.validate()?;

        let mut errors = Vec::new();
        if let Some(stype_id) = details.stype_id {
            let belongs = match conferences::get_submission_type(&mut tx, stype_id).await {
                Ok(stype) => stype.conference_id == conference_id,
                Err(Error::NotFound(_)) => false,
                Err(e) => return Err(e),
            };
            if !belongs {
                errors.push(FieldError::new(
                    "stype_id",
                    format!("Submission type #{} is not offered by this conference", stype_id),
                ));
            }
        }
        let topics = conferences::list_topics(&mut tx, conference_id).await?;
        for topic_id in &details.topic_ids {
            if !topics.iter().any(|t| t.id == *topic_id) {
                errors.push(FieldError::new(
                    "topic_ids",
                    format!("Topic #{} is not a topic of this conference", topic_id),
                ));
            }
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        submissions::update_details(&mut tx, sub.id, details).await?;
        submissions::set_topics(&mut tx, sub.id, &details.topic_ids).await?;
        tx.commit().await?;

        info!(submission_id, "Submission details updated");
        Ok(Submission {
            title: details.title.clone(),
            r#abstract: details.r#abstract.clone(),
            stype_id: details.stype_id,
            ..sub
        })
    }

    /// Append a registered user to the author list
    pub async fn add_author(&self, conference_id: i64, submission_id: i64, user_id: i64) -> Result<Author> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        ensure_editable(&sub, sub.can_edit_details(), "authors")?;
        users::get_user(&mut tx, user_id).await?;
        let author = submissions::add_author(&mut tx, sub.id, user_id).await?;
        tx.commit().await?;

        info!(submission_id, user_id, "Author added");
        Ok(author)
    }

    /// Remove an author other than the creator of the submission
    pub async fn delete_author(&self, conference_id: i64, submission_id: i64, user_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        ensure_editable(&sub, sub.can_edit_details(), "authors")?;
        if sub.created_by == Some(user_id) {
            return Err(Error::InvalidInput(format!(
                "user #{} created submission #{} and cannot be removed",
                user_id, sub.id
            )));
        }
        submissions::delete_author(&mut tx, sub.id, user_id).await?;
        tx.commit().await?;

        info!(submission_id, user_id, "Author removed");
        Ok(())
    }

    /// Reorder the authors; returns the new author list
    pub async fn reorder_authors(
        &self,
        conference_id: i64,
        submission_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<Author>> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        ensure_editable(&sub, sub.can_edit_details(), "authors")?;
        submissions::reorder_authors(&mut tx, sub.id, user_ids).await?;
        let authors = submissions::list_authors(&mut tx, sub.id).await?;
        tx.commit().await?;
        Ok(authors)
    }

    /// Drop the review manuscript of a submitted paper
    pub async fn delete_review_manuscript(&self, conference_id: i64, submission_id: i64) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        ensure_editable(&sub, sub.can_edit_review_manuscript(), "review manuscript")?;
        submissions::set_review_manuscript(&mut tx, sub.id, None).await?;
        tx.commit().await?;

        info!(submission_id, file = ?sub.review_manuscript, "Review manuscript deleted");
        Ok(Submission {
            review_manuscript: None,
            ..sub
        })
    }

    /// Delete a submission that is not published
    pub async fn delete_submission(&self, conference_id: i64, submission_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let sub = load_submission(&mut tx, conference_id, submission_id).await?;
        if !sub.is_deletable() {
            return Err(Error::PermissionDenied(format!(
                "submission #{} is published",
                sub.id
            )));
        }
        submissions::delete_submission(&mut tx, sub.id).await?;
        tx.commit().await?;

        info!(submission_id, status = %sub.status, "Submission deleted");
        Ok(())
    }
}

/// Submission of the conference; a submission of another conference is
/// reported as missing
async fn load_submission(
    conn: &mut SqliteConnection,
    conference_id: i64,
    submission_id: i64,
) -> Result<Submission> {
    let sub = submissions::get_submission(conn, submission_id).await?;
    if sub.conference_id != conference_id {
        return Err(Error::not_found("submission", submission_id));
    }
    Ok(sub)
}

async fn stype_of(conn: &mut SqliteConnection, sub: &Submission) -> Result<Option<SubmissionType>> {
    match sub.stype_id {
        Some(id) => Ok(Some(conferences::get_submission_type(conn, id).await?)),
        None => Ok(None),
    }
}

fn ensure_editable(sub: &Submission, allowed: bool, what: &str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "{} of submission #{} cannot be changed in status {}",
            what, sub.id, sub.status
        )))
    }
}

fn check_transition(
    from: SubmissionStatus,
    allowed_from: &[SubmissionStatus],
    to: SubmissionStatus,
) -> Result<()> {
    if allowed_from.contains(&from) {
        from.transition(to).map(|_| ())
    } else {
        Err(Error::InvalidTransition { from, to })
    }
}

async fn change_status(
    conn: &mut SqliteConnection,
    sub: &Submission,
    to: SubmissionStatus,
) -> Result<DccnEvent> {
    submissions::set_status(conn, sub.id, to).await?;
    Ok(DccnEvent::SubmissionStatusChanged {
        conference_id: sub.conference_id,
        submission_id: sub.id,
        old_status: sub.status,
        new_status: to,
        timestamp: time::now(),
    })
}

/// Decision type of the committed decision, if any
async fn current_decision(
    conn: &mut SqliteConnection,
    submission_id: i64,
) -> Result<Option<ReviewDecisionType>> {
    let Some(stage) = reviews::find_stage_by_submission(conn, submission_id).await? else {
        return Ok(None);
    };
    let Some(decision) = decisions::find_decision_by_stage(conn, stage.id).await? else {
        return Ok(None);
    };
    match decision.decision_type_id {
        Some(id) if decision.committed => Ok(Some(decisions::get_decision_type(conn, id).await?)),
        _ => Ok(None),
    }
}

/// Recompute the `active` flag of every camera-ready row of the submission
///
/// With `create`, missing rows for the proceedings of an ACCEPT decision are
/// added first.
async fn sync_camera_ready(
    conn: &mut SqliteConnection,
    submission_id: i64,
    status: SubmissionStatus,
    decision_type: Option<&ReviewDecisionType>,
    create: bool,
) -> Result<()> {
    let kind = decision_type.map(|dt| dt.decision);
    let allowed: &[i64] = decision_type
        .map(|dt| dt.allowed_proceedings.as_slice())
        .unwrap_or(&[]);

    if create && kind == Some(DecisionKind::Accept) {
        for proc_type_id in allowed {
            proceedings::ensure_camera_ready(conn, submission_id, *proc_type_id).await?;
        }
    }

    for cr in proceedings::list_camera_ready(conn, submission_id).await? {
        let active = CameraReady::should_be_active(cr.proc_type_id, status, kind, allowed);
        if active != cr.active {
            proceedings::set_active(conn, cr.id, active).await?;
        }
    }
    Ok(())
}
