//! Decision type and review decision queries

use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::model::{DecisionKind, ReviewDecision, ReviewDecisionType};
use crate::{Error, Result};

pub(crate) fn decision_from_row(row: &SqliteRow) -> Result<ReviewDecision> {
    Ok(ReviewDecision {
        id: row.try_get("decision_id")?,
        stage_id: row.try_get("stage_id")?,
        decision_type_id: row.try_get("decision_type_id")?,
        committed: row.try_get("committed")?,
    })
}

const DECISION_COLUMNS: &str = "id AS decision_id, stage_id, decision_type_id, committed";

async fn allowed_proceedings(conn: &mut SqliteConnection, decision_type_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT proc_type_id FROM decision_type_proceedings \
         WHERE decision_type_id = ? ORDER BY proc_type_id",
    )
    .bind(decision_type_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

fn decision_type_from_row(row: &SqliteRow, allowed: Vec<i64>) -> Result<ReviewDecisionType> {
    let decision: String = row.try_get("decision")?;
    Ok(ReviewDecisionType {
        id: row.try_get("id")?,
        conference_id: row.try_get("conference_id")?,
        decision: decision.parse::<DecisionKind>()?,
        description: row.try_get("description")?,
        allowed_proceedings: allowed,
    })
}

pub async fn create_decision_type(
    conn: &mut SqliteConnection,
    decision_type: &ReviewDecisionType,
) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO decision_types (conference_id, decision, description) VALUES (?, ?, ?)",
    )
    .bind(decision_type.conference_id)
    .bind(decision_type.decision.code())
    .bind(&decision_type.description)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for proc_type_id in &decision_type.allowed_proceedings {
        sqlx::query(
            "INSERT OR IGNORE INTO decision_type_proceedings (decision_type_id, proc_type_id) \
             VALUES (?, ?)",
        )
        .bind(id)
        .bind(proc_type_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(id)
}

pub async fn get_decision_type(conn: &mut SqliteConnection, id: i64) -> Result<ReviewDecisionType> {
    let row = sqlx::query("SELECT * FROM decision_types WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("decision type", id))?;
    let allowed = allowed_proceedings(conn, id).await?;
    decision_type_from_row(&row, allowed)
}

pub async fn list_decision_types(
    conn: &mut SqliteConnection,
    conference_id: i64,
) -> Result<Vec<ReviewDecisionType>> {
    let rows = sqlx::query("SELECT * FROM decision_types WHERE conference_id = ? ORDER BY id")
        .bind(conference_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut types = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let allowed = allowed_proceedings(conn, id).await?;
        types.push(decision_type_from_row(row, allowed)?);
    }
    Ok(types)
}

pub async fn find_decision_by_stage(
    conn: &mut SqliteConnection,
    stage_id: i64,
) -> Result<Option<ReviewDecision>> {
    let sql = format!("SELECT {} FROM review_decisions WHERE stage_id = ?", DECISION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(stage_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(decision_from_row).transpose()
}

/// The decision of the stage, created empty if missing
pub async fn ensure_decision(conn: &mut SqliteConnection, stage_id: i64) -> Result<ReviewDecision> {
    sqlx::query("INSERT OR IGNORE INTO review_decisions (stage_id) VALUES (?)")
        .bind(stage_id)
        .execute(&mut *conn)
        .await?;

    find_decision_by_stage(conn, stage_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("decision of stage #{} vanished", stage_id)))
}

pub async fn save_decision(conn: &mut SqliteConnection, decision: &ReviewDecision) -> Result<()> {
    sqlx::query("UPDATE review_decisions SET decision_type_id = ?, committed = ? WHERE id = ?")
        .bind(decision.decision_type_id)
        .bind(decision.committed)
        .bind(decision.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_db;

    #[tokio::test]
    async fn test_decision_type_roundtrip() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let conf_id = sqlx::query("INSERT INTO conferences (short_name) VALUES ('DCCN')")
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();
        let pt_id = sqlx::query("INSERT INTO proceeding_types (conference_id, name) VALUES (?, 'CCIS')")
            .bind(conf_id)
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();

        let dt = ReviewDecisionType {
            id: 0,
            conference_id: conf_id,
            decision: DecisionKind::Accept,
            description: "Accept to CCIS".into(),
            allowed_proceedings: vec![pt_id],
        };
        let id = create_decision_type(&mut conn, &dt).await.unwrap();
        let loaded = get_decision_type(&mut conn, id).await.unwrap();
        assert_eq!(loaded, ReviewDecisionType { id, ..dt });
        assert_eq!(list_decision_types(&mut conn, conf_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_decision_per_stage() {
        let db = test_db().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let conf_id = sqlx::query("INSERT INTO conferences (short_name) VALUES ('DCCN')")
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();
        let sub_id = sqlx::query("INSERT INTO submissions (conference_id, created_at) VALUES (?, '2019-04-01')")
            .bind(conf_id)
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();
        let stage_id = sqlx::query("INSERT INTO review_stages (submission_id) VALUES (?)")
            .bind(sub_id)
            .execute(&mut *conn)
            .await
            .unwrap()
            .last_insert_rowid();

        let mut d1 = ensure_decision(&mut conn, stage_id).await.unwrap();
        let d2 = ensure_decision(&mut conn, stage_id).await.unwrap();
        assert_eq!(d1.id, d2.id);
        assert!(!d1.committed);

        d1.committed = true;
        save_decision(&mut conn, &d1).await.unwrap();
        let loaded = find_decision_by_stage(&mut conn, stage_id).await.unwrap().unwrap();
        assert!(loaded.committed);
        assert_eq!(loaded.decision_type_id, None);
    }
}
