//! Submission, authorship and topic queries

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{Author, Submission, SubmissionDetails, SubmissionStatus};
use crate::{Error, Result};

pub(crate) fn submission_from_row(row: &SqliteRow) -> Result<Submission> {
    let status: String = row.try_get("status")?;
    Ok(Submission {
        id: row.try_get("id")?,
        conference_id: row.try_get("conference_id")?,
        title: row.try_get("title")?,
        r#abstract: row.try_get("abstract")?,
        stype_id: row.try_get("stype_id")?,
        status: status.parse::<SubmissionStatus>()?,
        review_manuscript: row.try_get("review_manuscript")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn author_from_row(row: &SqliteRow) -> Result<Author> {
    Ok(Author {
        id: row.try_get("author_id")?,
        submission_id: row.try_get("submission_id")?,
        user_id: row.try_get("user_id")?,
        order: row.try_get("sort_order")?,
    })
}

/// Insert a submission; `id` of the argument is ignored
pub async fn create_submission(conn: &mut SqliteConnection, sub: &Submission) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO submissions (
            conference_id, title, abstract, stype_id, status, review_manuscript,
            created_by, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sub.conference_id)
    .bind(&sub.title)
    .bind(&sub.r#abstract)
    .bind(sub.stype_id)
    .bind(sub.status.code())
    .bind(&sub.review_manuscript)
    .bind(sub.created_by)
    .bind(sub.created_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn get_submission(conn: &mut SqliteConnection, id: i64) -> Result<Submission> {
    let row = sqlx::query("SELECT * FROM submissions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("submission", id))?;
    submission_from_row(&row)
}

pub async fn list_submissions(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<Submission>> {
    let rows = sqlx::query("SELECT * FROM submissions WHERE conference_id = ? ORDER BY id")
        .bind(conference_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(submission_from_row).collect()
}

/// Store a status; transition rules are checked by the caller
pub async fn set_status(conn: &mut SqliteConnection, id: i64, status: SubmissionStatus) -> Result<()> {
    let result = sqlx::query("UPDATE submissions SET status = ? WHERE id = ?")
        .bind(status.code())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("submission", id));
    }
    Ok(())
}

/// Title, abstract and submission type; limits are checked by the caller
pub async fn update_details(
    conn: &mut SqliteConnection,
    id: i64,
    details: &SubmissionDetails,
) -> Result<()> {
    let result = sqlx::query("UPDATE submissions SET title = ?, abstract = ?, stype_id = ? WHERE id = ?")
        .bind(&details.title)
        .bind(&details.r#abstract)
        .bind(details.stype_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("submission", id));
    }
    Ok(())
}

pub async fn set_review_manuscript(
    conn: &mut SqliteConnection,
    id: i64,
    file_name: Option<&str>,
) -> Result<()> {
    let result = sqlx::query("UPDATE submissions SET review_manuscript = ? WHERE id = ?")
        .bind(file_name)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("submission", id));
    }
    Ok(())
}

/// Remove a submission with its authors, topics, reviews and camera-ready rows
pub async fn delete_submission(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("submission", id));
    }
    Ok(())
}

/// Replace the topics of a submission
pub async fn set_topics(conn: &mut SqliteConnection, submission_id: i64, topic_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM submission_topics WHERE submission_id = ?")
        .bind(submission_id)
        .execute(&mut *conn)
        .await?;
    for topic_id in topic_ids {
        sqlx::query("INSERT OR IGNORE INTO submission_topics (submission_id, topic_id) VALUES (?, ?)")
            .bind(submission_id)
            .bind(topic_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

const AUTHOR_COLUMNS: &str = "id AS author_id, submission_id, user_id, sort_order";

pub async fn list_authors(conn: &mut SqliteConnection, submission_id: i64) -> Result<Vec<Author>> {
    let sql = format!(
        "SELECT {} FROM authors WHERE submission_id = ? ORDER BY sort_order, id",
        AUTHOR_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(submission_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(author_from_row).collect()
}

/// Append an author at the end of the author list
pub async fn add_author(conn: &mut SqliteConnection, submission_id: i64, user_id: i64) -> Result<Author> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM authors WHERE submission_id = ? AND user_id = ?)",
    )
    .bind(submission_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    if exists {
        return Err(Error::InvalidInput(format!(
            "user #{} is already an author of submission #{}",
            user_id, submission_id
        )));
    }

    let order: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE submission_id = ?")
        .bind(submission_id)
        .fetch_one(&mut *conn)
        .await?;
    let id = sqlx::query("INSERT INTO authors (submission_id, user_id, sort_order) VALUES (?, ?, ?)")
        .bind(submission_id)
        .bind(user_id)
        .bind(order)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(Author {
        id,
        submission_id,
        user_id,
        order,
    })
}

/// Remove an author and close the gap in the ordering
pub async fn delete_author(conn: &mut SqliteConnection, submission_id: i64, user_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM authors WHERE submission_id = ? AND user_id = ?")
        .bind(submission_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "author #{} of submission #{}",
            user_id, submission_id
        )));
    }
    let remaining: Vec<i64> = list_authors(conn, submission_id)
        .await?
        .iter()
        .map(|a| a.user_id)
        .collect();
    reorder_authors(conn, submission_id, &remaining).await
}

/// Set the author order to the given sequence of user ids
///
/// The list must name every author of the submission exactly once; orders
/// become `0..n`.
pub async fn reorder_authors(
    conn: &mut SqliteConnection,
    submission_id: i64,
    user_ids: &[i64],
) -> Result<()> {
    let mut current: Vec<i64> = list_authors(conn, submission_id)
        .await?
        .iter()
        .map(|a| a.user_id)
        .collect();
    let mut requested = user_ids.to_vec();
    current.sort_unstable();
    requested.sort_unstable();
    if current != requested {
        return Err(Error::InvalidInput(
            "author order must list every author exactly once".to_string(),
        ));
    }

    for (order, user_id) in user_ids.iter().enumerate() {
        sqlx::query("UPDATE authors SET sort_order = ? WHERE submission_id = ? AND user_id = ?")
            .bind(order as i64)
            .bind(submission_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;
    use crate::db::{conferences, users};
    use crate::model::Profile;
    use chrono::NaiveDate;

    async fn setup(conn: &mut SqliteConnection) -> (i64, Vec<i64>) {
        let conf_id = sqlx::query("INSERT INTO conferences (short_name) VALUES ('DCCN')")
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();
        let mut user_ids = Vec::new();
        for i in 0..3 {
            let u = users::create_user(conn, &format!("u{}@example.org", i), &Profile::default())
                .await
                .unwrap();
            user_ids.push(u.id());
        }
        let sub = Submission {
            id: 0,
            conference_id: conf_id,
            title: "Retrial queues".into(),
            r#abstract: String::new(),
            stype_id: None,
            status: SubmissionStatus::Submitted,
            review_manuscript: None,
            created_by: Some(user_ids[0]),
            created_at: NaiveDate::from_ymd_opt(2019, 4, 1).unwrap(),
        };
        let sub_id = create_submission(conn, &sub).await.unwrap();
        assert!(!conferences::is_chair(conn, conf_id, user_ids[0]).await.unwrap());
        (sub_id, user_ids)
    }

    #[tokio::test]
    async fn test_submission_roundtrip_and_status() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let (sub_id, _) = setup(&mut conn).await;

        let sub = get_submission(&mut conn, sub_id).await.unwrap();
        assert_eq!(sub.status, SubmissionStatus::Submitted);
        assert_eq!(sub.title, "Retrial queues");

        set_status(&mut conn, sub_id, SubmissionStatus::UnderReview).await.unwrap();
        let sub = get_submission(&mut conn, sub_id).await.unwrap();
        assert_eq!(sub.status, SubmissionStatus::UnderReview);

        assert!(matches!(
            set_status(&mut conn, 999, SubmissionStatus::Accepted).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_author_order_stays_dense() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let (sub_id, users) = setup(&mut conn).await;

        for uid in &users {
            add_author(&mut conn, sub_id, *uid).await.unwrap();
        }
        assert!(add_author(&mut conn, sub_id, users[0]).await.is_err());

        delete_author(&mut conn, sub_id, users[1]).await.unwrap();
        let authors = list_authors(&mut conn, sub_id).await.unwrap();
        assert_eq!(
            authors.iter().map(|a| (a.user_id, a.order)).collect::<Vec<_>>(),
            vec![(users[0], 0), (users[2], 1)]
        );

        reorder_authors(&mut conn, sub_id, &[users[2], users[0]]).await.unwrap();
        let authors = list_authors(&mut conn, sub_id).await.unwrap();
        assert_eq!(authors[0].user_id, users[2]);
        assert_eq!(authors[1].order, 1);

        assert!(reorder_authors(&mut conn, sub_id, &[users[2]]).await.is_err());
    }

    #[tokio::test]
    async fn test_details_manuscript_topics_and_delete() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let (sub_id, _) = setup(&mut conn).await;
        let conf_id = get_submission(&mut conn, sub_id).await.unwrap().conference_id;

        let details = SubmissionDetails {
            title: "Retrial queues with orbits".into(),
            r#abstract: "Abstract".into(),
            ..Default::default()
        };
        update_details(&mut conn, sub_id, &details).await.unwrap();
        set_review_manuscript(&mut conn, sub_id, Some("paper.pdf")).await.unwrap();
        let sub = get_submission(&mut conn, sub_id).await.unwrap();
        assert_eq!(sub.title, "Retrial queues with orbits");
        assert_eq!(sub.r#abstract, "Abstract");
        assert!(sub.has_review_manuscript());

        assert!(matches!(
            update_details(&mut conn, 999, &details).await,
            Err(Error::NotFound(_))
        ));

        let t1 = conferences::create_topic(&mut conn, conf_id, "Queues", 1).await.unwrap();
        let t2 = conferences::create_topic(&mut conn, conf_id, "Networks", 2).await.unwrap();
        set_topics(&mut conn, sub_id, &[t1, t2, t1]).await.unwrap();
        set_topics(&mut conn, sub_id, &[t2]).await.unwrap();
        let topics: Vec<i64> = sqlx::query_scalar("SELECT topic_id FROM submission_topics WHERE submission_id = ?")
            .bind(sub_id)
            .fetch_all(&mut *conn)
            .await
            .unwrap();
        assert_eq!(topics, vec![t2]);

        delete_submission(&mut conn, sub_id).await.unwrap();
        assert!(matches!(get_submission(&mut conn, sub_id).await, Err(Error::NotFound(_))));
        assert!(matches!(delete_submission(&mut conn, sub_id).await, Err(Error::NotFound(_))));
    }
}
