//! HTTP API handlers for dccn-chair
//!
//! Chair routes live under `/api/conferences/:conf_id` and authorize through
//! the [`Chair`] extractor. The reviewer route authorizes through
//! [`ActingUser`] and an ownership check in the workflow.

pub mod auth;
pub mod dashboard;
pub mod decisions;
pub mod export;
pub mod extract;
pub mod health;
pub mod messages;
pub mod reviews;
pub mod sse;
pub mod submissions;
pub mod users;

pub use auth::{ActingUser, Chair, USER_HEADER};
pub use dashboard::dashboard_routes;
pub use decisions::decision_routes;
pub use export::export_routes;
pub use health::health_routes;
pub use messages::message_routes;
pub use reviews::review_routes;
pub use sse::sse_routes;
pub use submissions::submission_routes;
pub use users::user_routes;

use serde::Deserialize;

use dccn_common::db;
use dccn_common::ConferenceSnapshot;

use crate::{ApiResult, AppState};

/// `?page=` of list endpoints
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

pub(crate) async fn snapshot(state: &AppState, chair: &Chair) -> ApiResult<ConferenceSnapshot> {
    Ok(db::load_snapshot(&state.db, chair.conference_id).await?)
}
