//! Camera-ready and artifact queries

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{Artifact, CameraReady};
use crate::{Error, Result};

pub(crate) fn camera_ready_from_row(row: &SqliteRow) -> Result<CameraReady> {
    Ok(CameraReady {
        id: row.try_get("camera_ready_id")?,
        submission_id: row.try_get("submission_id")?,
        proc_type_id: row.try_get("proc_type_id")?,
        volume_id: row.try_get("volume_id")?,
        active: row.try_get("active")?,
    })
}

pub(crate) fn artifact_from_row(row: &SqliteRow) -> Result<Artifact> {
    Ok(Artifact {
        id: row.try_get("artifact_id")?,
        camera_ready_id: row.try_get("camera_ready_id")?,
        descriptor_id: row.try_get("descriptor_id")?,
        file_name: row.try_get("file_name")?,
    })
}

const CAMERA_READY_COLUMNS: &str =
    "id AS camera_ready_id, submission_id, proc_type_id, volume_id, active";

pub async fn get_camera_ready(conn: &mut SqliteConnection, id: i64) -> Result<CameraReady> {
    let sql = format!("SELECT {} FROM camera_ready WHERE id = ?", CAMERA_READY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("camera-ready", id))?;
    camera_ready_from_row(&row)
}

pub async fn list_camera_ready(
    conn: &mut SqliteConnection,
    submission_id: i64,
) -> Result<Vec<CameraReady>> {
    let sql = format!(
        "SELECT {} FROM camera_ready WHERE submission_id = ? ORDER BY id",
        CAMERA_READY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(submission_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(camera_ready_from_row).collect()
}

/// Camera-ready row of the (submission, proceedings type) pair, created if
/// missing together with one empty artifact per descriptor of the type
pub async fn ensure_camera_ready(
    conn: &mut SqliteConnection,
    submission_id: i64,
    proc_type_id: i64,
) -> Result<CameraReady> {
    sqlx::query("INSERT OR IGNORE INTO camera_ready (submission_id, proc_type_id) VALUES (?, ?)")
        .bind(submission_id)
        .bind(proc_type_id)
        .execute(&mut *conn)
        .await?;

    let sql = format!(
        "SELECT {} FROM camera_ready WHERE submission_id = ? AND proc_type_id = ?",
        CAMERA_READY_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(submission_id)
        .bind(proc_type_id)
        .fetch_one(&mut *conn)
        .await?;
    let camera_ready = camera_ready_from_row(&row)?;

    sqlx::query(
        "INSERT OR IGNORE INTO artifacts (camera_ready_id, descriptor_id) \
         SELECT ?, id FROM artifact_descriptors WHERE proc_type_id = ?",
    )
    .bind(camera_ready.id)
    .bind(proc_type_id)
    .execute(&mut *conn)
    .await?;

    Ok(camera_ready)
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<()> {
    sqlx::query("UPDATE camera_ready SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_volume(conn: &mut SqliteConnection, id: i64, volume_id: Option<i64>) -> Result<()> {
    sqlx::query("UPDATE camera_ready SET volume_id = ? WHERE id = ?")
        .bind(volume_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_artifacts(conn: &mut SqliteConnection, camera_ready_id: i64) -> Result<Vec<Artifact>> {
    let rows = sqlx::query(
        "SELECT id AS artifact_id, camera_ready_id, descriptor_id, file_name \
         FROM artifacts WHERE camera_ready_id = ? ORDER BY id",
    )
    .bind(camera_ready_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(artifact_from_row).collect()
}
