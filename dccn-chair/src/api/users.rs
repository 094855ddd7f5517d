//! Filtered user list

use axum::{extract::State, routing::get, Router};
use serde::Serialize;

use dccn_common::filters::FilterParams;
use dccn_common::ConferenceSnapshot;
use dccn_common::model::UserView;

use super::extract::{Json, Query};
use super::{snapshot, Chair, PageQuery};
use crate::pagination::Page;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct UserItem {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub full_name_rus: String,
    pub country: String,
    pub country_name: String,
    pub affiliation: String,
    pub degree: String,
    pub num_submissions: usize,
}

impl UserItem {
    fn new(user: &UserView, snapshot: &ConferenceSnapshot) -> Self {
        let profile = &user.profile;
        UserItem {
            id: user.id(),
            email: user.user.email.clone(),
            full_name: profile.full_name(),
            full_name_rus: profile.full_name_rus(),
            country: profile.country.clone(),
            country_name: profile.country_name().to_string(),
            affiliation: profile.affiliation.clone(),
            degree: profile.degree.clone(),
            num_submissions: snapshot.submissions_of(user.id()).len(),
        }
    }
}

/// GET /api/conferences/:conf_id/users
pub async fn list_users(
    State(state): State<AppState>,
    chair: Chair,
    Query(params): Query<FilterParams>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Page<UserItem>>> {
    let filter = params.user_filter()?;
    let snapshot = snapshot(&state, &chair).await?;
    let items = filter
        .apply(&snapshot)
        .into_iter()
        .map(|u| UserItem::new(u, &snapshot))
        .collect();
    Ok(Json(Page::from_items(items, page.page)))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/conferences/:conf_id/users", get(list_users))
}
