//! Loading a [`ConferenceSnapshot`] with one query per table

use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use super::conferences::{self, descriptor_from_row};
use super::decisions::{self, decision_from_row};
use super::proceedings::{artifact_from_row, camera_ready_from_row};
use super::reviews::{self, stage_from_row};
use super::submissions::{self, author_from_row};
use super::users::{self, user_from_row, USER_COLUMNS};
use crate::snapshot::{
    ArtifactView, AuthorView, CameraReadyView, ConferenceSnapshot, DecisionView, ReviewView,
    StageView, SubmissionView,
};
use crate::Result;

pub async fn load_snapshot(pool: &SqlitePool, conference_id: i64) -> Result<ConferenceSnapshot> {
    let mut conn = pool.acquire().await?;
    load_snapshot_with(&mut conn, conference_id).await
}

/// Same as [`load_snapshot`] on an open connection or transaction
pub async fn load_snapshot_with(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<ConferenceSnapshot> {
    let conference = conferences::get_conference(conn, conference_id).await?;
    let chairs = conferences::list_chairs(conn, conference_id).await?;
    let topics = conferences::list_topics(conn, conference_id).await?;
    let stypes = conferences::list_submission_types(conn, conference_id).await?;
    let proc_types = conferences::list_proceeding_types(conn, conference_id).await?;
    let volumes = conferences::list_volumes(conn, conference_id).await?;
    let decision_types = decisions::list_decision_types(conn, conference_id).await?;
    let reviewers = reviews::list_reviewers(conn, conference_id).await?;
    let users = users::list_active_users(conn).await?;
    let subs = submissions::list_submissions(conn, conference_id).await?;

    let mut authors: HashMap<i64, Vec<AuthorView>> = HashMap::new();
    let sql = format!(
        "SELECT a.id AS author_id, a.submission_id, a.user_id, a.sort_order, {} \
         FROM authors a \
         JOIN submissions s ON s.id = a.submission_id \
         JOIN users u ON u.id = a.user_id \
         LEFT JOIN profiles p ON p.user_id = u.id \
         WHERE s.conference_id = ? ORDER BY a.submission_id, a.sort_order, a.id",
        USER_COLUMNS
    );
    for row in sqlx::query(&sql).bind(conference_id).fetch_all(&mut *conn).await? {
        let author = author_from_row(&row)?;
        let user = user_from_row(&row)?;
        authors
            .entry(author.submission_id)
            .or_default()
            .push(AuthorView { author, user });
    }

    let mut topic_ids: HashMap<i64, Vec<i64>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT st.submission_id, st.topic_id FROM submission_topics st \
         JOIN submissions s ON s.id = st.submission_id \
         WHERE s.conference_id = ? ORDER BY st.submission_id, st.topic_id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let sub_id: i64 = row.try_get("submission_id")?;
        topic_ids.entry(sub_id).or_default().push(row.try_get("topic_id")?);
    }

    let mut reviews_by_stage: HashMap<i64, Vec<ReviewView>> = HashMap::new();
    for (review, reviewer) in reviews::list_conference_reviews(conn, conference_id).await? {
        reviews_by_stage
            .entry(review.stage_id)
            .or_default()
            .push(ReviewView { review, reviewer });
    }

    let mut decisions_by_stage: HashMap<i64, DecisionView> = HashMap::new();
    let rows = sqlx::query(
        "SELECT d.id AS decision_id, d.stage_id, d.decision_type_id, d.committed \
         FROM review_decisions d \
         JOIN review_stages st ON st.id = d.stage_id \
         JOIN submissions s ON s.id = st.submission_id \
         WHERE s.conference_id = ?",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let decision = decision_from_row(&row)?;
        let decision_type = decision
            .decision_type_id
            .and_then(|id| decision_types.iter().find(|dt| dt.id == id).cloned());
        decisions_by_stage.insert(
            decision.stage_id,
            DecisionView {
                decision,
                decision_type,
            },
        );
    }

    let mut stages: HashMap<i64, StageView> = HashMap::new();
    let rows = sqlx::query(
        "SELECT st.id AS stage_id, st.submission_id, st.num_reviews_required, st.locked \
         FROM review_stages st JOIN submissions s ON s.id = st.submission_id \
         WHERE s.conference_id = ?",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let stage = stage_from_row(&row)?;
        let reviews = reviews_by_stage.remove(&stage.id).unwrap_or_default();
        let decision = decisions_by_stage.remove(&stage.id);
        stages.insert(
            stage.submission_id,
            StageView {
                stage,
                reviews,
                decision,
            },
        );
    }

    let mut artifacts: HashMap<i64, Vec<ArtifactView>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT a.id AS artifact_id, a.camera_ready_id, a.descriptor_id, a.file_name, \
                d.proc_type_id, d.name, d.code, d.description, d.mandatory \
         FROM artifacts a \
         JOIN artifact_descriptors d ON d.id = a.descriptor_id \
         JOIN camera_ready cr ON cr.id = a.camera_ready_id \
         JOIN submissions s ON s.id = cr.submission_id \
         WHERE s.conference_id = ? ORDER BY a.id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let artifact = artifact_from_row(&row)?;
        let descriptor = descriptor_from_row(&row)?;
        artifacts
            .entry(artifact.camera_ready_id)
            .or_default()
            .push(ArtifactView {
                artifact,
                descriptor,
            });
    }

    let mut camera_ready: HashMap<i64, Vec<CameraReadyView>> = HashMap::new();
    let rows = sqlx::query(
        "SELECT cr.id AS camera_ready_id, cr.submission_id, cr.proc_type_id, cr.volume_id, cr.active \
         FROM camera_ready cr JOIN submissions s ON s.id = cr.submission_id \
         WHERE s.conference_id = ? ORDER BY cr.id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let cr = camera_ready_from_row(&row)?;
        let items = artifacts.remove(&cr.id).unwrap_or_default();
        camera_ready
            .entry(cr.submission_id)
            .or_default()
            .push(CameraReadyView {
                camera_ready: cr,
                artifacts: items,
            });
    }

    let submissions: Vec<SubmissionView> = subs
        .into_iter()
        .map(|submission| {
            let id = submission.id;
            let stype = submission
                .stype_id
                .and_then(|st_id| stypes.iter().find(|st| st.id == st_id).cloned());
            SubmissionView {
                submission,
                authors: authors.remove(&id).unwrap_or_default(),
                topic_ids: topic_ids.remove(&id).unwrap_or_default(),
                stype,
                stage: stages.remove(&id),
                camera_ready: camera_ready.remove(&id).unwrap_or_default(),
            }
        })
        .collect();

    debug!(
        conference_id,
        submissions = submissions.len(),
        users = users.len(),
        "Loaded conference snapshot"
    );

    Ok(ConferenceSnapshot {
        conference,
        chairs,
        topics,
        stypes,
        proc_types,
        volumes,
        decision_types,
        reviewers,
        submissions,
        users,
    })
}
