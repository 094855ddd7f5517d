//! Chair dashboard summary

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use dccn_common::stats::StatusPartition;

use super::{snapshot, Chair};
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct TypeCount {
    pub stype_id: Option<i64>,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub conference: String,
    pub num_submissions: usize,
    pub num_authors: usize,
    pub num_users: usize,
    pub status: StatusPartition,
    pub types: Vec<TypeCount>,
}

/// GET /api/conferences/:conf_id/dashboard
pub async fn dashboard(State(state): State<AppState>, chair: Chair) -> ApiResult<Json<DashboardResponse>> {
    let snapshot = snapshot(&state, &chair).await?;

    let mut types: Vec<TypeCount> = snapshot
        .stypes
        .iter()
        .map(|st| TypeCount {
            stype_id: Some(st.id),
            name: st.name.clone(),
            count: snapshot
                .submissions
                .iter()
                .filter(|s| s.submission.stype_id == Some(st.id))
                .count(),
        })
        .collect();
    let untyped = snapshot
        .submissions
        .iter()
        .filter(|s| s.submission.stype_id.is_none())
        .count();
    if untyped > 0 {
        types.push(TypeCount {
            stype_id: None,
            name: "(no type)".to_string(),
            count: untyped,
        });
    }

    Ok(Json(DashboardResponse {
        conference: snapshot.conference.short_name.clone(),
        num_submissions: snapshot.submissions.len(),
        num_authors: snapshot.author_ids().len(),
        num_users: snapshot.users.len(),
        status: StatusPartition::compute(&snapshot.submissions),
        types,
    }))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/api/conferences/:conf_id/dashboard", get(dashboard))
}
