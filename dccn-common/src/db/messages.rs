//! Group messages and their rendered per-recipient copies

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use uuid::Uuid;

use crate::mailing::{MessageKind, RenderedEmail};
use crate::time;
use crate::{Error, Result};

/// A message addressed to a set of users or submissions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMessage {
    pub id: Uuid,
    pub conference_id: i64,
    pub kind: MessageKind,
    pub subject: String,
    pub body: String,
    /// Ids of users or submissions, depending on `kind`
    pub recipients: Vec<i64>,
    /// Chair who composed the message; `None` for system notifications
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl GroupMessage {
    pub fn new(
        conference_id: i64,
        kind: MessageKind,
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<i64>,
        created_by: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conference_id,
            kind,
            subject: subject.into(),
            body: body.into(),
            recipients,
            created_by,
            created_at: time::now(),
        }
    }
}

/// Stored copy of a group message for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub id: i64,
    pub group_message_id: Uuid,
    pub user_to: i64,
    pub email: String,
    pub submission_id: Option<i64>,
    pub subject: String,
    pub text_plain: String,
}

fn group_message_from_row(row: &SqliteRow) -> Result<GroupMessage> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let recipients: String = row.try_get("recipients")?;
    Ok(GroupMessage {
        id: Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("bad message id {}: {}", id, e)))?,
        conference_id: row.try_get("conference_id")?,
        kind: kind.parse::<MessageKind>()?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        recipients: serde_json::from_str(&recipients)
            .map_err(|e| Error::Internal(format!("bad recipients of message {}: {}", id, e)))?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn email_from_row(row: &SqliteRow) -> Result<EmailMessage> {
    let group_id: String = row.try_get("group_message_id")?;
    Ok(EmailMessage {
        id: row.try_get("id")?,
        group_message_id: Uuid::parse_str(&group_id)
            .map_err(|e| Error::Internal(format!("bad message id {}: {}", group_id, e)))?,
        user_to: row.try_get("user_to")?,
        email: row.try_get("email")?,
        submission_id: row.try_get("submission_id")?,
        subject: row.try_get("subject")?,
        text_plain: row.try_get("text_plain")?,
    })
}

/// Store the group message and its rendered copies
pub async fn insert_group_message(
    conn: &mut SqliteConnection,
    message: &GroupMessage,
    emails: &[RenderedEmail],
) -> Result<()> {
    let recipients = serde_json::to_string(&message.recipients)
        .map_err(|e| Error::Internal(format!("cannot encode recipients: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO group_messages (
            id, conference_id, kind, subject, body, recipients, created_by, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(message.conference_id)
    .bind(message.kind.code())
    .bind(&message.subject)
    .bind(&message.body)
    .bind(recipients)
    .bind(message.created_by)
    .bind(message.created_at)
    .execute(&mut *conn)
    .await?;

    for email in emails {
        sqlx::query(
            r#"
            INSERT INTO email_messages (
                group_message_id, user_to, email, submission_id, subject, text_plain
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id.to_string())
        .bind(email.user_to)
        .bind(&email.email)
        .bind(email.submission_id)
        .bind(&email.subject)
        .bind(&email.text_plain)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Messages of the conference, newest first
pub async fn list_group_messages(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<GroupMessage>> {
    let rows = sqlx::query(
        "SELECT * FROM group_messages WHERE conference_id = ? ORDER BY created_at DESC, id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(group_message_from_row).collect()
}

pub async fn get_group_message(conn: &mut SqliteConnection, id: Uuid) -> Result<GroupMessage> {
    let row = sqlx::query("SELECT * FROM group_messages WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("message {}", id)))?;
    group_message_from_row(&row)
}

pub async fn list_email_messages(
    conn: &mut SqliteConnection,
    group_message_id: Uuid,
) -> Result<Vec<EmailMessage>> {
    let rows = sqlx::query("SELECT * FROM email_messages WHERE group_message_id = ? ORDER BY id")
        .bind(group_message_id.to_string())
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(email_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    #[tokio::test]
    async fn test_group_message_roundtrip() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let conf_id = sqlx::query("INSERT INTO conferences (short_name) VALUES ('DCCN')")
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();
        let user_id = sqlx::query("INSERT INTO users (email) VALUES ('a@example.org')")
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();

        let message = GroupMessage::new(
            conf_id,
            MessageKind::User,
            "Hello {{ username }}",
            "Body",
            vec![user_id],
            None,
        );
        let email = RenderedEmail {
            user_to: user_id,
            email: "a@example.org".into(),
            submission_id: None,
            subject: "Hello Anna".into(),
            text_plain: "Body".into(),
        };
        insert_group_message(&mut conn, &message, &[email]).await.unwrap();

        let loaded = get_group_message(&mut conn, message.id).await.unwrap();
        assert_eq!(loaded.recipients, vec![user_id]);
        assert_eq!(loaded.kind, MessageKind::User);
        assert_eq!(list_group_messages(&mut conn, conf_id).await.unwrap().len(), 1);

        let emails = list_email_messages(&mut conn, message.id).await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Hello Anna");
        assert_eq!(emails[0].group_message_id, message.id);
    }
}
