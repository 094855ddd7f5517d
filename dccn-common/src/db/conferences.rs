//! Conference configuration queries: conferences, chairs, topics, submission
//! types, proceedings types, volumes and artifact descriptors

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{
    ArtifactDescriptor, Conference, Language, ProceedingType, ProceedingVolume, SubmissionType,
    Topic,
};
use crate::{Error, Result};

fn conference_from_row(row: &SqliteRow) -> Result<Conference> {
    Ok(Conference {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        short_name: row.try_get("short_name")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        start_date: row.try_get("start_date")?,
        close_date: row.try_get("close_date")?,
        site_url: row.try_get("site_url")?,
        contact_email: row.try_get("contact_email")?,
        submission_end: row.try_get("submission_end")?,
        review_end: row.try_get("review_end")?,
    })
}

pub async fn create_conference(conn: &mut SqliteConnection, conf: &Conference) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO conferences (
            full_name, short_name, city, country, start_date, close_date,
            site_url, contact_email, submission_end, review_end
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&conf.full_name)
    .bind(&conf.short_name)
    .bind(&conf.city)
    .bind(&conf.country)
    .bind(conf.start_date)
    .bind(conf.close_date)
    .bind(&conf.site_url)
    .bind(&conf.contact_email)
    .bind(conf.submission_end)
    .bind(conf.review_end)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn get_conference(conn: &mut SqliteConnection, id: i64) -> Result<Conference> {
    let row = sqlx::query("SELECT * FROM conferences WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("conference", id))?;
    conference_from_row(&row)
}

pub async fn add_chair(conn: &mut SqliteConnection, conference_id: i64, user_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO conference_chairs (conference_id, user_id) VALUES (?, ?)")
        .bind(conference_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_chairs(conn: &mut SqliteConnection, conference_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT user_id FROM conference_chairs WHERE conference_id = ? ORDER BY user_id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

pub async fn is_chair(conn: &mut SqliteConnection, conference_id: i64, user_id: i64) -> Result<bool> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM conference_chairs WHERE conference_id = ? AND user_id = ?)",
    )
    .bind(conference_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(found)
}

pub async fn create_topic(
    conn: &mut SqliteConnection,
    conference_id: i64,
    name: &str,
    order: i64,
) -> Result<i64> {
    let id = sqlx::query("INSERT INTO topics (conference_id, name, sort_order) VALUES (?, ?, ?)")
        .bind(conference_id)
        .bind(name)
        .bind(order)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    Ok(id)
}

pub async fn list_topics(conn: &mut SqliteConnection, conference_id: i64) -> Result<Vec<Topic>> {
    let rows = sqlx::query(
        "SELECT id, conference_id, name, sort_order FROM topics \
         WHERE conference_id = ? ORDER BY sort_order, id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(Topic {
                id: row.try_get("id")?,
                conference_id: row.try_get("conference_id")?,
                name: row.try_get("name")?,
                order: row.try_get("sort_order")?,
            })
        })
        .collect()
}

async fn linked_ids(conn: &mut SqliteConnection, sql: &str, owner_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(sql).bind(owner_id).fetch_all(&mut *conn).await?;
    Ok(ids)
}

fn stype_from_row(row: &SqliteRow, possible_proceedings: Vec<i64>) -> Result<SubmissionType> {
    let language: String = row.try_get("language")?;
    Ok(SubmissionType {
        id: row.try_get("id")?,
        conference_id: row.try_get("conference_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        language: language.parse::<Language>()?,
        num_reviews: row.try_get("num_reviews")?,
        min_num_pages: row.try_get("min_num_pages")?,
        max_num_pages: row.try_get("max_num_pages")?,
        blind_review: row.try_get("blind_review")?,
        min_num_words_in_review: row.try_get("min_num_words_in_review")?,
        possible_proceedings,
    })
}

const STYPE_PROCEEDINGS_SQL: &str =
    "SELECT proc_type_id FROM submission_type_proceedings WHERE stype_id = ? ORDER BY proc_type_id";

pub async fn create_submission_type(conn: &mut SqliteConnection, stype: &SubmissionType) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO submission_types (
            conference_id, name, description, language, num_reviews, min_num_pages,
            max_num_pages, blind_review, min_num_words_in_review
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stype.conference_id)
    .bind(&stype.name)
    .bind(&stype.description)
    .bind(stype.language.code())
    .bind(stype.num_reviews)
    .bind(stype.min_num_pages)
    .bind(stype.max_num_pages)
    .bind(stype.blind_review)
    .bind(stype.min_num_words_in_review)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for proc_type_id in &stype.possible_proceedings {
        sqlx::query(
            "INSERT OR IGNORE INTO submission_type_proceedings (stype_id, proc_type_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(proc_type_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}

pub async fn get_submission_type(conn: &mut SqliteConnection, id: i64) -> Result<SubmissionType> {
    let row = sqlx::query("SELECT * FROM submission_types WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("submission type", id))?;
    let possible = linked_ids(conn, STYPE_PROCEEDINGS_SQL, id).await?;
    stype_from_row(&row, possible)
}

pub async fn list_submission_types(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<SubmissionType>> {
    let rows = sqlx::query("SELECT * FROM submission_types WHERE conference_id = ? ORDER BY id")
        .bind(conference_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut stypes = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let possible = linked_ids(conn, STYPE_PROCEEDINGS_SQL, id).await?;
        stypes.push(stype_from_row(row, possible)?);
    }
    Ok(stypes)
}

pub async fn create_proceeding_type(conn: &mut SqliteConnection, pt: &ProceedingType) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO proceeding_types (
            conference_id, name, description, final_manuscript_deadline,
            min_num_pages, max_num_pages
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pt.conference_id)
    .bind(&pt.name)
    .bind(&pt.description)
    .bind(pt.final_manuscript_deadline)
    .bind(pt.min_num_pages)
    .bind(pt.max_num_pages)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn list_proceeding_types(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<ProceedingType>> {
    let rows = sqlx::query("SELECT * FROM proceeding_types WHERE conference_id = ? ORDER BY id")
        .bind(conference_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(ProceedingType {
                id: row.try_get("id")?,
                conference_id: row.try_get("conference_id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                final_manuscript_deadline: row.try_get("final_manuscript_deadline")?,
                min_num_pages: row.try_get("min_num_pages")?,
                max_num_pages: row.try_get("max_num_pages")?,
            })
        })
        .collect()
}

fn volume_from_row(row: &SqliteRow) -> Result<ProceedingVolume> {
    Ok(ProceedingVolume {
        id: row.try_get("id")?,
        proc_type_id: row.try_get("proc_type_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

pub async fn create_volume(conn: &mut SqliteConnection, volume: &ProceedingVolume) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO proceeding_volumes (proc_type_id, name, description) VALUES (?, ?, ?)",
    )
    .bind(volume.proc_type_id)
    .bind(&volume.name)
    .bind(&volume.description)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn get_volume(conn: &mut SqliteConnection, id: i64) -> Result<ProceedingVolume> {
    let row = sqlx::query("SELECT * FROM proceeding_volumes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("volume", id))?;
    volume_from_row(&row)
}

/// Volumes of every proceedings type of the conference
pub async fn list_volumes(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<ProceedingVolume>> {
    let rows = sqlx::query(
        "SELECT v.* FROM proceeding_volumes v \
         JOIN proceeding_types pt ON pt.id = v.proc_type_id \
         WHERE pt.conference_id = ? ORDER BY v.id",
    )
    .bind(conference_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(volume_from_row).collect()
}

pub(crate) fn descriptor_from_row(row: &SqliteRow) -> Result<ArtifactDescriptor> {
    Ok(ArtifactDescriptor {
        id: row.try_get("descriptor_id")?,
        proc_type_id: row.try_get("proc_type_id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        description: row.try_get("description")?,
        mandatory: row.try_get("mandatory")?,
    })
}

pub async fn create_artifact_descriptor(
    conn: &mut SqliteConnection,
    descriptor: &ArtifactDescriptor,
) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO artifact_descriptors (proc_type_id, name, code, description, mandatory) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(descriptor.proc_type_id)
    .bind(&descriptor.name)
    .bind(&descriptor.code)
    .bind(&descriptor.description)
    .bind(descriptor.mandatory)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}
