//! Decisions and camera-ready volume assignment

use axum::{
    extract::State,
    routing::{post, put},
    Router,
};
use serde::Deserialize;

use dccn_common::model::{CameraReady, ReviewDecision, Submission};

use super::extract::{Json, Path};
use super::Chair;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub decision_type_id: Option<i64>,
}

/// PUT /api/conferences/:conf_id/decisions/:sub_id
pub async fn update_decision(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, sub_id)): Path<(i64, i64)>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<ReviewDecision>> {
    let decision = state
        .workflow
        .update_decision(chair.conference_id, sub_id, req.decision_type_id)
        .await?;
    Ok(Json(decision))
}

/// POST /api/conferences/:conf_id/decisions/:sub_id/commit
pub async fn commit_decision(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, sub_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.commit_decision(chair.conference_id, sub_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    #[serde(default)]
    pub volume_id: Option<i64>,
}

/// PUT /api/conferences/:conf_id/camera-ready/:cr_id/volume
pub async fn assign_volume(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, cr_id)): Path<(i64, i64)>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<Json<CameraReady>> {
    let camera_ready = state
        .workflow
        .assign_volume(chair.conference_id, cr_id, req.volume_id)
        .await?;
    Ok(Json(camera_ready))
}

pub fn decision_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conferences/:conf_id/decisions/:sub_id", put(update_decision))
        .route(
            "/api/conferences/:conf_id/decisions/:sub_id/commit",
            post(commit_decision),
        )
        .route(
            "/api/conferences/:conf_id/camera-ready/:cr_id/volume",
            put(assign_volume),
        )
}
