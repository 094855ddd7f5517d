//! Database initialization
//!
//! Opens (creating if needed) the SQLite file under the root folder and
//! creates every table idempotently. Safe to run on each startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Current schema version, recorded in `schema_version`
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL lets the HTTP handlers read while the notification listener writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema_version_table(&pool).await?;

    // Users and conference configuration
    create_users_table(&pool).await?;
    create_profiles_table(&pool).await?;
    create_conferences_table(&pool).await?;
    create_conference_chairs_table(&pool).await?;
    create_topics_table(&pool).await?;
    create_proceeding_types_table(&pool).await?;
    create_proceeding_volumes_table(&pool).await?;
    create_artifact_descriptors_table(&pool).await?;
    create_submission_types_table(&pool).await?;
    create_decision_types_table(&pool).await?;

    // Submissions and review
    create_submissions_table(&pool).await?;
    create_authors_table(&pool).await?;
    create_reviewers_table(&pool).await?;
    create_review_stages_table(&pool).await?;
    create_reviews_table(&pool).await?;
    create_review_decisions_table(&pool).await?;

    // Proceedings
    create_camera_ready_table(&pool).await?;
    create_artifacts_table(&pool).await?;

    // Mailing
    create_group_messages_table(&pool).await?;
    create_email_messages_table(&pool).await?;

    record_schema_version(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn record_schema_version(pool: &SqlitePool) -> Result<()> {
    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    match version {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {
            info!("Database schema is up to date (v{})", v);
        }
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            warn!(
                "Database schema version ({}) is newer than code version ({})",
                v, CURRENT_SCHEMA_VERSION
            );
        }
        _ => {
            sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
                .bind(CURRENT_SCHEMA_VERSION)
                .execute(pool)
                .await?;
            info!("Database schema set to v{}", CURRENT_SCHEMA_VERSION);
        }
    }

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            date_joined TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            first_name_rus TEXT NOT NULL DEFAULT '',
            middle_name_rus TEXT NOT NULL DEFAULT '',
            last_name_rus TEXT NOT NULL DEFAULT '',
            affiliation TEXT NOT NULL DEFAULT '',
            degree TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_conferences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conferences (
            id INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL DEFAULT '',
            short_name TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '',
            start_date DATE,
            close_date DATE,
            site_url TEXT NOT NULL DEFAULT '',
            contact_email TEXT NOT NULL DEFAULT '',
            submission_end TIMESTAMP,
            review_end TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_conference_chairs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conference_chairs (
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (conference_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_topics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_proceeding_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proceeding_types (
            id INTEGER PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            final_manuscript_deadline TIMESTAMP,
            min_num_pages INTEGER NOT NULL DEFAULT 4,
            max_num_pages INTEGER NOT NULL DEFAULT 4
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_proceeding_volumes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proceeding_volumes (
            id INTEGER PRIMARY KEY,
            proc_type_id INTEGER NOT NULL REFERENCES proceeding_types(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_artifact_descriptors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifact_descriptors (
            id INTEGER PRIMARY KEY,
            proc_type_id INTEGER NOT NULL REFERENCES proceeding_types(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            mandatory INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submission_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_types (
            id INTEGER PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT 'EN',
            num_reviews INTEGER NOT NULL DEFAULT 2,
            min_num_pages INTEGER NOT NULL DEFAULT 4,
            max_num_pages INTEGER NOT NULL DEFAULT 4,
            blind_review INTEGER NOT NULL DEFAULT 0,
            min_num_words_in_review INTEGER NOT NULL DEFAULT 150
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_type_proceedings (
            stype_id INTEGER NOT NULL REFERENCES submission_types(id) ON DELETE CASCADE,
            proc_type_id INTEGER NOT NULL REFERENCES proceeding_types(id) ON DELETE CASCADE,
            PRIMARY KEY (stype_id, proc_type_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_decision_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decision_types (
            id INTEGER PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            decision TEXT NOT NULL CHECK (decision IN ('ACCEPT', 'REJECT')),
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decision_type_proceedings (
            decision_type_id INTEGER NOT NULL REFERENCES decision_types(id) ON DELETE CASCADE,
            proc_type_id INTEGER NOT NULL REFERENCES proceeding_types(id) ON DELETE CASCADE,
            PRIMARY KEY (decision_type_id, proc_type_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id INTEGER PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            title TEXT NOT NULL DEFAULT '',
            abstract TEXT NOT NULL DEFAULT '',
            stype_id INTEGER REFERENCES submission_types(id) ON DELETE SET NULL,
            status TEXT NOT NULL DEFAULT 'SUBMIT',
            review_manuscript TEXT,
            created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at DATE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_conference ON submissions(conference_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_topics (
            submission_id INTEGER NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
            topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            PRIMARY KEY (submission_id, topic_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_authors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY,
            submission_id INTEGER NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            UNIQUE (submission_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviewers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviewers (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            UNIQUE (user_id, conference_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_review_stages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS review_stages (
            id INTEGER PRIMARY KEY,
            submission_id INTEGER NOT NULL UNIQUE REFERENCES submissions(id) ON DELETE CASCADE,
            num_reviews_required INTEGER NOT NULL DEFAULT 0,
            locked INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY,
            reviewer_id INTEGER NOT NULL REFERENCES reviewers(id) ON DELETE CASCADE,
            stage_id INTEGER NOT NULL REFERENCES review_stages(id) ON DELETE CASCADE,
            technical_merit INTEGER CHECK (technical_merit BETWEEN 1 AND 5),
            clarity INTEGER CHECK (clarity BETWEEN 1 AND 5),
            relevance INTEGER CHECK (relevance BETWEEN 1 AND 5),
            originality INTEGER CHECK (originality BETWEEN 1 AND 5),
            details TEXT NOT NULL DEFAULT '',
            submitted INTEGER NOT NULL DEFAULT 0,
            UNIQUE (reviewer_id, stage_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_review_decisions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS review_decisions (
            id INTEGER PRIMARY KEY,
            stage_id INTEGER NOT NULL UNIQUE REFERENCES review_stages(id) ON DELETE CASCADE,
            decision_type_id INTEGER REFERENCES decision_types(id) ON DELETE SET NULL,
            committed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_camera_ready_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS camera_ready (
            id INTEGER PRIMARY KEY,
            submission_id INTEGER NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
            proc_type_id INTEGER NOT NULL REFERENCES proceeding_types(id) ON DELETE CASCADE,
            volume_id INTEGER REFERENCES proceeding_volumes(id) ON DELETE SET NULL,
            active INTEGER NOT NULL DEFAULT 0,
            UNIQUE (submission_id, proc_type_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_artifacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            id INTEGER PRIMARY KEY,
            camera_ready_id INTEGER NOT NULL REFERENCES camera_ready(id) ON DELETE CASCADE,
            descriptor_id INTEGER NOT NULL REFERENCES artifact_descriptors(id) ON DELETE CASCADE,
            file_name TEXT,
            UNIQUE (camera_ready_id, descriptor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_group_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_messages (
            id TEXT PRIMARY KEY,
            conference_id INTEGER NOT NULL REFERENCES conferences(id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('user', 'submission')),
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            recipients TEXT NOT NULL DEFAULT '[]',
            created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_email_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS email_messages (
            id INTEGER PRIMARY KEY,
            group_message_id TEXT NOT NULL REFERENCES group_messages(id) ON DELETE CASCADE,
            user_to INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            submission_id INTEGER REFERENCES submissions(id) ON DELETE SET NULL,
            subject TEXT NOT NULL,
            text_plain TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
