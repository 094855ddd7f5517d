//! Request identity
//!
//! Session authentication is handled in front of this service; requests
//! carry the id of the acting user in the `X-Dccn-User` header. Chair routes
//! additionally require that user to chair the conference in the path.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use tracing::warn;

use dccn_common::db::conferences;

use crate::{ApiError, AppState};

pub const USER_HEADER: &str = "x-dccn-user";

/// Id of the user performing the request
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ApiError::BadRequest("missing X-Dccn-User header".to_string()))?;
        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(ActingUser)
            .ok_or_else(|| ApiError::BadRequest("invalid X-Dccn-User header".to_string()))
    }
}

/// Acting user verified as chair of the `:conf_id` conference
#[derive(Debug, Clone, Copy)]
pub struct Chair {
    pub user_id: i64,
    pub conference_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for Chair {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ActingUser(user_id) = ActingUser::from_request_parts(parts, state).await?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state).await?;
        let conference_id = params
            .get("conf_id")
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| ApiError::BadRequest("invalid conference id".to_string()))?;

        let mut conn = state.db.acquire().await?;
        if !conferences::is_chair(&mut conn, conference_id, user_id).await? {
            warn!(user_id, conference_id, "Chair access denied");
            return Err(ApiError::Forbidden(format!(
                "user #{} is not a chair of conference #{}",
                user_id, conference_id
            )));
        }

        Ok(Chair {
            user_id,
            conference_id,
        })
    }
}
