//! User and profile queries

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{Profile, User, UserView};
use crate::time;
use crate::{Error, Result};

pub(crate) const USER_COLUMNS: &str = "u.id, u.email, u.is_active, u.date_joined, \
     p.first_name, p.last_name, p.first_name_rus, p.middle_name_rus, p.last_name_rus, \
     p.affiliation, p.degree, p.country";

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<UserView> {
    Ok(UserView {
        user: User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            is_active: row.try_get("is_active")?,
            date_joined: row.try_get("date_joined")?,
        },
        profile: Profile {
            first_name: row.try_get::<Option<String>, _>("first_name")?.unwrap_or_default(),
            last_name: row.try_get::<Option<String>, _>("last_name")?.unwrap_or_default(),
            first_name_rus: row.try_get::<Option<String>, _>("first_name_rus")?.unwrap_or_default(),
            middle_name_rus: row.try_get::<Option<String>, _>("middle_name_rus")?.unwrap_or_default(),
            last_name_rus: row.try_get::<Option<String>, _>("last_name_rus")?.unwrap_or_default(),
            affiliation: row.try_get::<Option<String>, _>("affiliation")?.unwrap_or_default(),
            degree: row.try_get::<Option<String>, _>("degree")?.unwrap_or_default(),
            country: row.try_get::<Option<String>, _>("country")?.unwrap_or_default(),
        },
    })
}

/// Register a user together with the profile
pub async fn create_user(
    conn: &mut SqliteConnection,
    email: &str,
    profile: &Profile,
) -> Result<UserView> {
    let date_joined = time::now();
    let id = sqlx::query("INSERT INTO users (email, is_active, date_joined) VALUES (?, 1, ?)")
        .bind(email)
        .bind(date_joined)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    save_profile(conn, id, profile).await?;

    Ok(UserView {
        user: User {
            id,
            email: email.to_string(),
            is_active: true,
            date_joined,
        },
        profile: profile.clone(),
    })
}

/// Insert or replace the profile of a user
pub async fn save_profile(conn: &mut SqliteConnection, user_id: i64, profile: &Profile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (
            user_id, first_name, last_name, first_name_rus, middle_name_rus, last_name_rus,
            affiliation, degree, country
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            first_name_rus = excluded.first_name_rus,
            middle_name_rus = excluded.middle_name_rus,
            last_name_rus = excluded.last_name_rus,
            affiliation = excluded.affiliation,
            degree = excluded.degree,
            country = excluded.country
        "#,
    )
    .bind(user_id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.first_name_rus)
    .bind(&profile.middle_name_rus)
    .bind(&profile.last_name_rus)
    .bind(&profile.affiliation)
    .bind(&profile.degree)
    .bind(profile.country.to_uppercase())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn get_user(conn: &mut SqliteConnection, id: i64) -> Result<UserView> {
    let sql = format!(
        "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE u.id = ?",
        USER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("user", id))?;
    user_from_row(&row)
}

/// All active users, ordered by id
pub async fn list_active_users(conn: &mut SqliteConnection) -> Result<Vec<UserView>> {
    let sql = format!(
        "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id \
         WHERE u.is_active = 1 ORDER BY u.id",
        USER_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("user", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    fn profile(first: &str, last: &str, country: &str) -> Profile {
        Profile {
            first_name: first.to_string(),
            last_name: last.to_string(),
            country: country.to_string(),
            ..Profile::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        let created = create_user(&mut conn, "anna@example.org", &profile("Anna", "Ivanova", "ru"))
            .await
            .unwrap();
        let loaded = get_user(&mut conn, created.id()).await.unwrap();
        assert_eq!(loaded.user.email, "anna@example.org");
        assert_eq!(loaded.full_name(), "Anna Ivanova");
        assert_eq!(loaded.profile.country, "RU");
        assert!(loaded.user.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        create_user(&mut conn, "a@example.org", &Profile::default()).await.unwrap();
        let err = create_user(&mut conn, "a@example.org", &Profile::default()).await;
        assert!(matches!(err, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_inactive_users_not_listed() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();

        let a = create_user(&mut conn, "a@example.org", &Profile::default()).await.unwrap();
        let b = create_user(&mut conn, "b@example.org", &Profile::default()).await.unwrap();
        set_active(&mut conn, a.id(), false).await.unwrap();

        let users = list_active_users(&mut conn).await.unwrap();
        assert_eq!(users.iter().map(|u| u.id()).collect::<Vec<_>>(), vec![b.id()]);
        assert!(matches!(get_user(&mut conn, 999).await, Err(Error::NotFound(_))));
    }
}
