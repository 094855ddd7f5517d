//! CSV export downloads

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use dccn_common::export;

use super::{snapshot, Chair};
use crate::{ApiResult, AppState};

fn csv_response(file_name: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
}

/// GET /api/conferences/:conf_id/export/submissions.csv
pub async fn export_submissions(State(state): State<AppState>, chair: Chair) -> ApiResult<impl IntoResponse> {
    let snapshot = snapshot(&state, &chair).await?;
    let body = export::submissions_csv(&snapshot)?;
    Ok(csv_response("submissions.csv", body))
}

/// GET /api/conferences/:conf_id/export/users.csv
pub async fn export_users(State(state): State<AppState>, chair: Chair) -> ApiResult<impl IntoResponse> {
    let snapshot = snapshot(&state, &chair).await?;
    let body = export::users_csv(&snapshot)?;
    Ok(csv_response("users.csv", body))
}

pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/conferences/:conf_id/export/submissions.csv",
            get(export_submissions),
        )
        .route("/api/conferences/:conf_id/export/users.csv", get(export_users))
}
