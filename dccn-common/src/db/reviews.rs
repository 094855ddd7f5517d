//! Review stage, reviewer and review queries

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{Review, ReviewStage, Reviewer, Score};
use crate::{Error, Result};

pub(crate) fn stage_from_row(row: &SqliteRow) -> Result<ReviewStage> {
    Ok(ReviewStage {
        id: row.try_get("stage_id")?,
        submission_id: row.try_get("submission_id")?,
        num_reviews_required: row.try_get("num_reviews_required")?,
        locked: row.try_get("locked")?,
    })
}

fn score_column(row: &SqliteRow, column: &str) -> Result<Option<Score>> {
    row.try_get::<Option<i64>, _>(column)?
        .map(Score::try_from)
        .transpose()
}

pub(crate) fn review_from_row(row: &SqliteRow) -> Result<Review> {
    Ok(Review {
        id: row.try_get("review_id")?,
        reviewer_id: row.try_get("reviewer_id")?,
        stage_id: row.try_get("stage_id")?,
        technical_merit: score_column(row, "technical_merit")?,
        clarity: score_column(row, "clarity")?,
        relevance: score_column(row, "relevance")?,
        originality: score_column(row, "originality")?,
        details: row.try_get("details")?,
        submitted: row.try_get("submitted")?,
    })
}

pub(crate) fn reviewer_from_row(row: &SqliteRow) -> Result<Reviewer> {
    Ok(Reviewer {
        id: row.try_get("reviewer_id")?,
        user_id: row.try_get("reviewer_user_id")?,
        conference_id: row.try_get("reviewer_conference_id")?,
    })
}

const STAGE_COLUMNS: &str = "id AS stage_id, submission_id, num_reviews_required, locked";

const REVIEW_COLUMNS: &str = "r.id AS review_id, r.reviewer_id, r.stage_id, r.technical_merit, \
     r.clarity, r.relevance, r.originality, r.details, r.submitted, \
     rv.user_id AS reviewer_user_id, rv.conference_id AS reviewer_conference_id";

pub async fn get_stage(conn: &mut SqliteConnection, id: i64) -> Result<ReviewStage> {
    let sql = format!("SELECT {} FROM review_stages WHERE id = ?", STAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("review stage", id))?;
    stage_from_row(&row)
}

pub async fn find_stage_by_submission(
    conn: &mut SqliteConnection,
    submission_id: i64,
) -> Result<Option<ReviewStage>> {
    let sql = format!("SELECT {} FROM review_stages WHERE submission_id = ?", STAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(submission_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(stage_from_row).transpose()
}

/// Review stage of the submission, created if missing
pub async fn ensure_stage(
    conn: &mut SqliteConnection,
    submission_id: i64,
    num_reviews_required: i64,
) -> Result<ReviewStage> {
    sqlx::query(
        "INSERT OR IGNORE INTO review_stages (submission_id, num_reviews_required) VALUES (?, ?)",
    )
    .bind(submission_id)
    .bind(num_reviews_required)
    .execute(&mut *conn)
    .await?;

    find_stage_by_submission(conn, submission_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("review stage of submission #{} vanished", submission_id)))
}

pub async fn set_stage_locked(conn: &mut SqliteConnection, stage_id: i64, locked: bool) -> Result<()> {
    sqlx::query("UPDATE review_stages SET locked = ? WHERE id = ?")
        .bind(locked)
        .bind(stage_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Reviewer record of the user in the conference, created if missing
pub async fn ensure_reviewer(
    conn: &mut SqliteConnection,
    conference_id: i64,
    user_id: i64,
) -> Result<Reviewer> {
    sqlx::query("INSERT OR IGNORE INTO reviewers (user_id, conference_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(conference_id)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM reviewers WHERE user_id = ? AND conference_id = ?")
        .bind(user_id)
        .bind(conference_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(Reviewer {
        id,
        user_id,
        conference_id,
    })
}

pub async fn list_reviewers(conn: &mut SqliteConnection, conference_id: i64) -> Result<Vec<Reviewer>> {
    let rows = sqlx::query(
        "SELECT id AS reviewer_id, user_id AS reviewer_user_id, conference_id AS reviewer_conference_id \
         FROM reviewers WHERE conference_id = ? ORDER BY id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(reviewer_from_row).collect()
}

/// Empty review of the stage assigned to the reviewer
pub async fn create_review(conn: &mut SqliteConnection, reviewer_id: i64, stage_id: i64) -> Result<Review> {
    let id = sqlx::query("INSERT INTO reviews (reviewer_id, stage_id) VALUES (?, ?)")
        .bind(reviewer_id)
        .bind(stage_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(Review {
        id,
        reviewer_id,
        stage_id,
        technical_merit: None,
        clarity: None,
        relevance: None,
        originality: None,
        details: String::new(),
        submitted: false,
    })
}

/// Review together with its reviewer
pub async fn get_review(conn: &mut SqliteConnection, id: i64) -> Result<(Review, Reviewer)> {
    let sql = format!(
        "SELECT {} FROM reviews r JOIN reviewers rv ON rv.id = r.reviewer_id WHERE r.id = ?",
        REVIEW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("review", id))?;
    Ok((review_from_row(&row)?, reviewer_from_row(&row)?))
}

pub async fn list_reviews(conn: &mut SqliteConnection, stage_id: i64) -> Result<Vec<(Review, Reviewer)>> {
    let sql = format!(
        "SELECT {} FROM reviews r JOIN reviewers rv ON rv.id = r.reviewer_id \
         WHERE r.stage_id = ? ORDER BY r.id",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(stage_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| Ok((review_from_row(row)?, reviewer_from_row(row)?)))
        .collect()
}

/// Reviews of every submission of the conference, keyed by stage in the rows
pub(crate) async fn list_conference_reviews(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<(Review, Reviewer)>> {
    let sql = format!(
        "SELECT {} FROM reviews r \
         JOIN reviewers rv ON rv.id = r.reviewer_id \
         JOIN review_stages st ON st.id = r.stage_id \
         JOIN submissions s ON s.id = st.submission_id \
         WHERE s.conference_id = ? ORDER BY r.id",
        REVIEW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(conference_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| Ok((review_from_row(row)?, reviewer_from_row(row)?)))
        .collect()
}

/// Scores, details and the submitted flag
pub async fn save_review(conn: &mut SqliteConnection, review: &Review) -> Result<()> {
    let score = |s: Option<Score>| s.map(i64::from);
    sqlx::query(
        r#"
        UPDATE reviews SET
            technical_merit = ?, clarity = ?, relevance = ?, originality = ?,
            details = ?, submitted = ?
        WHERE id = ?
        "#,
    )
    .bind(score(review.technical_merit))
    .bind(score(review.clarity))
    .bind(score(review.relevance))
    .bind(score(review.originality))
    .bind(&review.details)
    .bind(review.submitted)
    .bind(review.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete_review(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("review", id));
    }
    Ok(())
}
