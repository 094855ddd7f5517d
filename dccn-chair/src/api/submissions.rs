//! Submission list and lifecycle endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use dccn_common::filters::{self, FilterOptions, FilterParams};
use dccn_common::model::{
    ArtifactAccess, Author, Review, Submission, SubmissionDetails, SubmissionStatus,
};
use dccn_common::{ConferenceSnapshot, Error, SubmissionView};

use super::extract::{Json, Path, Query};
use super::{snapshot, Chair, PageQuery};
use crate::pagination::Page;
use crate::{ApiResult, AppState};

/// Row of the chair submission list
#[derive(Debug, Serialize)]
pub struct SubmissionItem {
    pub id: i64,
    pub title: String,
    pub status: SubmissionStatus,
    pub stype: Option<String>,
    pub authors: String,
    pub warnings: Vec<String>,
    pub score: f64,
    pub num_reviews: usize,
    pub num_missing_reviews: i64,
    pub created_at: NaiveDate,
}

impl From<&SubmissionView> for SubmissionItem {
    fn from(sub: &SubmissionView) -> Self {
        SubmissionItem {
            id: sub.id(),
            title: sub.submission.title.clone(),
            status: sub.status(),
            stype: sub.stype.as_ref().map(|st| st.name.clone()),
            authors: sub.authors_display(),
            warnings: sub.warnings(),
            score: sub.score(),
            num_reviews: sub.reviews().len(),
            num_missing_reviews: sub.count_missing_reviews(),
            created_at: sub.submission.created_at,
        }
    }
}

/// GET /api/conferences/:conf_id/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    chair: Chair,
    Query(params): Query<FilterParams>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Page<SubmissionItem>>> {
    let filter = params.submission_filter()?;
    let snapshot = snapshot(&state, &chair).await?;
    let items: Vec<SubmissionItem> = filter
        .apply(&snapshot.submissions)
        .into_iter()
        .map(SubmissionItem::from)
        .collect();
    Ok(Json(Page::from_items(items, page.page)))
}

/// GET /api/conferences/:conf_id/submissions/filter-options
pub async fn filter_options(State(state): State<AppState>, chair: Chair) -> ApiResult<Json<FilterOptions>> {
    let snapshot = snapshot(&state, &chair).await?;
    Ok(Json(filters::filter_options(&snapshot)))
}

pub async fn start_review(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.start_review(chair.conference_id, id).await?))
}

pub async fn revoke_review(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.revoke_review(chair.conference_id, id).await?))
}

pub async fn send_to_print(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.send_to_print(chair.conference_id, id).await?))
}

pub async fn publish(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.publish(chair.conference_id, id).await?))
}

pub async fn revoke_print(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(state.workflow.revoke_print(chair.conference_id, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AssignReviewerRequest {
    pub user_id: i64,
}

/// POST /api/conferences/:conf_id/submissions/:id/reviewers
pub async fn assign_reviewer(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
    Json(req): Json<AssignReviewerRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let review = state
        .workflow
        .assign_reviewer(chair.conference_id, id, req.user_id)
        .await?;
    info!(chair = chair.user_id, submission_id = id, "Reviewer assigned by chair");
    Ok((StatusCode::CREATED, Json(review)))
}

/// DELETE /api/conferences/:conf_id/submissions/:id/reviews/:review_id
pub async fn delete_review(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id, review_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .workflow
        .delete_review(chair.conference_id, id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/conferences/:conf_id/submissions/:id
///
/// Published papers are kept.
pub async fn delete_submission(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state.workflow.delete_submission(chair.conference_id, id).await?;
    info!(chair = chair.user_id, submission_id = id, "Submission deleted by chair");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/conferences/:conf_id/submissions/:id/metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
    Json(details): Json<SubmissionDetails>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(
        state
            .workflow
            .update_details(chair.conference_id, id, &details)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct AddAuthorRequest {
    pub user_id: i64,
}

/// POST /api/conferences/:conf_id/submissions/:id/authors
pub async fn add_author(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
    Json(req): Json<AddAuthorRequest>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    let author = state
        .workflow
        .add_author(chair.conference_id, id, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[derive(Debug, Deserialize)]
pub struct ReorderAuthorsRequest {
    pub user_ids: Vec<i64>,
}

/// PUT /api/conferences/:conf_id/submissions/:id/authors
pub async fn reorder_authors(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
    Json(req): Json<ReorderAuthorsRequest>,
) -> ApiResult<Json<Vec<Author>>> {
    Ok(Json(
        state
            .workflow
            .reorder_authors(chair.conference_id, id, &req.user_ids)
            .await?,
    ))
}

/// DELETE /api/conferences/:conf_id/submissions/:id/authors/:user_id
pub async fn delete_author(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id, user_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    state
        .workflow
        .delete_author(chair.conference_id, id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/conferences/:conf_id/submissions/:id/review-manuscript
pub async fn delete_review_manuscript(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Submission>> {
    Ok(Json(
        state
            .workflow
            .delete_review_manuscript(chair.conference_id, id)
            .await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct ArtifactItem {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub mandatory: bool,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CameraReadyItem {
    pub id: i64,
    pub proc_type_id: i64,
    pub proc_type: String,
    pub volume_id: Option<i64>,
    pub volume: Option<String>,
    pub active: bool,
    pub access: ArtifactAccess,
    pub artifacts: Vec<ArtifactItem>,
}

fn camera_ready_items(sub: &SubmissionView, snapshot: &ConferenceSnapshot) -> Vec<CameraReadyItem> {
    sub.camera_ready
        .iter()
        .map(|cr| {
            let camera_ready = &cr.camera_ready;
            CameraReadyItem {
                id: camera_ready.id,
                proc_type_id: camera_ready.proc_type_id,
                proc_type: snapshot
                    .proc_types
                    .iter()
                    .find(|pt| pt.id == camera_ready.proc_type_id)
                    .map(|pt| pt.name.clone())
                    .unwrap_or_default(),
                volume_id: camera_ready.volume_id,
                volume: camera_ready.volume_id.and_then(|vid| {
                    snapshot
                        .volumes
                        .iter()
                        .find(|v| v.id == vid)
                        .map(|v| v.name.clone())
                }),
                active: camera_ready.active,
                access: sub.artifact_access(camera_ready),
                artifacts: cr
                    .artifacts
                    .iter()
                    .map(|a| ArtifactItem {
                        id: a.artifact.id,
                        name: a.descriptor.name.clone(),
                        code: a.descriptor.code.clone(),
                        mandatory: a.descriptor.mandatory,
                        file_name: a.artifact.file_name.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// GET /api/conferences/:conf_id/submissions/:id/camera-ready
pub async fn list_camera_ready(
    State(state): State<AppState>,
    chair: Chair,
    Path((_, id)): Path<(i64, i64)>,
) -> ApiResult<Json<Vec<CameraReadyItem>>> {
    let snapshot = snapshot(&state, &chair).await?;
    let sub = snapshot
        .submission(id)
        .ok_or_else(|| Error::not_found("submission", id))?;
    Ok(Json(camera_ready_items(sub, &snapshot)))
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conferences/:conf_id/submissions", get(list_submissions))
        .route(
            "/api/conferences/:conf_id/submissions/:id",
            delete(delete_submission),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/metadata",
            put(update_metadata),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/authors",
            post(add_author).put(reorder_authors),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/authors/:user_id",
            delete(delete_author),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/review-manuscript",
            delete(delete_review_manuscript),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/camera-ready",
            get(list_camera_ready),
        )
        .route(
            "/api/conferences/:conf_id/submissions/filter-options",
            get(filter_options),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/start-review",
            post(start_review),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/revoke-review",
            post(revoke_review),
        )
        .route("/api/conferences/:conf_id/submissions/:id/print", post(send_to_print))
        .route("/api/conferences/:conf_id/submissions/:id/publish", post(publish))
        .route(
            "/api/conferences/:conf_id/submissions/:id/revoke-print",
            post(revoke_print),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/reviewers",
            post(assign_reviewer),
        )
        .route(
            "/api/conferences/:conf_id/submissions/:id/reviews/:review_id",
            delete(delete_review),
        )
}
